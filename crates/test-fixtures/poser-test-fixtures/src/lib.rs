use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    rigs: HashMap<String, RigEntry>,
}

/// A rig fixture: the scene document, optionally with a pose library.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RigEntry {
    Scene(String),
    Detailed {
        scene: String,
        #[serde(default)]
        poses: Option<String>,
    },
}

impl RigEntry {
    fn scene(&self) -> &str {
        match self {
            RigEntry::Scene(path) => path,
            RigEntry::Detailed { scene, .. } => scene,
        }
    }

    fn poses(&self) -> Option<&str> {
        match self {
            RigEntry::Scene(_) => None,
            RigEntry::Detailed { poses, .. } => poses.as_deref(),
        }
    }
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

pub mod rigs {
    use super::*;

    pub fn keys() -> Vec<String> {
        let mut keys: Vec<String> = MANIFEST.rigs.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn scene_json(name: &str) -> Result<String> {
        let entry = lookup(&MANIFEST.rigs, "rig", name)?;
        read_to_string(entry.scene())
    }

    pub fn scene<T: DeserializeOwned>(name: &str) -> Result<T> {
        let entry = lookup(&MANIFEST.rigs, "rig", name)?;
        super::load_json(entry.scene())
    }

    pub fn poses_json(name: &str) -> Result<Option<String>> {
        let entry = lookup(&MANIFEST.rigs, "rig", name)?;
        match entry.poses() {
            Some(poses) => read_to_string(poses).map(Some),
            None => Ok(None),
        }
    }

    pub fn poses<T: DeserializeOwned>(name: &str) -> Result<Option<T>> {
        let entry = lookup(&MANIFEST.rigs, "rig", name)?;
        match entry.poses() {
            Some(poses) => super::load_json(poses).map(Some),
            None => Ok(None),
        }
    }

    pub fn scene_path(name: &str) -> Result<PathBuf> {
        let entry = lookup(&MANIFEST.rigs, "rig", name)?;
        Ok(resolve_path(entry.scene()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_rig_fixture_parses_as_json() {
        for key in rigs::keys() {
            let scene: serde_json::Value = rigs::scene(&key).unwrap();
            assert!(scene.get("objects").is_some(), "{key} has no objects");
            if let Some(poses) = rigs::poses::<serde_json::Value>(&key).unwrap() {
                assert!(poses.get("poses").is_some(), "{key} poses has no list");
            }
        }
    }

    #[test]
    fn unknown_rig_is_an_error() {
        assert!(rigs::scene_json("missing").is_err());
    }
}
