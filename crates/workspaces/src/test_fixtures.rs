//! In-memory project fixtures for unit tests.

use crate::core::types::{PackageDescriptor, WorkspaceInfo, WorkspaceInfos};
use crate::discovery::memory::InMemoryProject;
use crate::graph::ProjectGraph;
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

/// Builds a project whose workspaces live under `/repo/packages/<name>`.
///
/// Every workspace gets version `1.0.0` and `main` `src/index.js` unless
/// overridden. Workspace dependencies are derived when the graph is built.
#[derive(Default)]
pub struct ProjectBuilder {
    order: Vec<String>,
    descriptors: HashMap<String, PackageDescriptor>,
    mismatched: Vec<(String, String)>,
}

impl ProjectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workspace(mut self, name: &str, deps: &[(&str, &str)]) -> Self {
        let descriptor = PackageDescriptor {
            name: Some(name.to_string()),
            version: Some("1.0.0".to_string()),
            main: Some("src/index.js".to_string()),
            dependencies: deps
                .iter()
                .map(|(dep, range)| ((*dep).to_string(), (*range).to_string()))
                .collect(),
            ..PackageDescriptor::default()
        };
        self.order.push(name.to_string());
        self.descriptors.insert(name.to_string(), descriptor);
        self
    }

    fn edit(mut self, name: &str, f: impl FnOnce(&mut PackageDescriptor)) -> Self {
        if let Some(descriptor) = self.descriptors.get_mut(name) {
            f(descriptor);
        }
        self
    }

    pub fn dev_dependency(self, name: &str, dep: &str, range: &str) -> Self {
        self.edit(name, |d| {
            d.dev_dependencies.insert(dep.to_string(), range.to_string());
        })
    }

    pub fn version(self, name: &str, version: &str) -> Self {
        self.edit(name, |d| d.version = Some(version.to_string()))
    }

    pub fn no_version(self, name: &str) -> Self {
        self.edit(name, |d| d.version = None)
    }

    pub fn license(self, name: &str, license: &str) -> Self {
        self.edit(name, |d| d.license = Some(license.to_string()))
    }

    pub fn main(self, name: &str, main: &str) -> Self {
        self.edit(name, |d| d.main = Some(main.to_string()))
    }

    pub fn without_main(self, name: &str) -> Self {
        self.edit(name, |d| d.main = None)
    }

    pub fn mismatched(mut self, name: &str, dep: &str) -> Self {
        self.mismatched.push((name.to_string(), dep.to_string()));
        self
    }

    pub fn infos(&self) -> WorkspaceInfos {
        self.order
            .iter()
            .map(|name| {
                let descriptor = &self.descriptors[name];
                let mut info = WorkspaceInfo::new(format!("packages/{name}"));
                for dep in descriptor
                    .dependencies
                    .keys()
                    .chain(descriptor.dev_dependencies.keys())
                {
                    if !self.descriptors.contains_key(dep) {
                        continue;
                    }
                    let is_mismatched = self
                        .mismatched
                        .iter()
                        .any(|(owner, target)| owner == name && target == dep);
                    if is_mismatched {
                        info.mismatched_workspace_dependencies.push(dep.clone());
                    } else {
                        info.workspace_dependencies.push(dep.clone());
                    }
                }
                (name.clone(), info)
            })
            .collect()
    }

    pub fn graph(&self) -> ProjectGraph {
        ProjectGraph::build("/repo", &self.infos(), &self.descriptors).unwrap()
    }

    pub fn into_memory(self) -> InMemoryProject {
        let infos = self.infos();
        InMemoryProject::new(infos, self.descriptors)
    }
}

/// Collects formatted `WARN`-and-above events emitted while running a closure.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        tracing::subscriber::with_default(subscriber, f)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
