// In-process scene graph and keyframe clips.
//
// The scene is described by a JSON manifest exported alongside the badge models: node
// names with their bounding sizes, positions and materials, and the lifetime clips that
// animate them. Rendering backends read the resulting graph; the alert pipeline only needs
// membership, parenting, bounds and clip timing.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::controller::BadgeRig;
use super::scene::{AnimationClip, BadgeKind, NodeId, Scene, Transform, Vec3};
use crate::core::error::AssetError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub name: String,
    pub size: Vec3,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub material: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipSpec {
    pub name: String,
    /// Node the clip animates
    pub target: String,
    pub duration_seconds: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneManifest {
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub animations: Vec<ClipSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub size: Vec3,
    pub transform: Transform,
    pub material: Option<String>,
    pub parent: Option<NodeId>,
    /// Set for text nodes
    pub text: Option<String>,
}

#[derive(Debug, Default)]
pub struct HeadlessScene {
    nodes: HashMap<NodeId, SceneNode>,
    in_scene: BTreeSet<NodeId>,
    next_id: NodeId,
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_node(&mut self, spec: &NodeSpec) -> NodeId {
        self.insert(SceneNode {
            name: spec.name.clone(),
            size: spec.size,
            transform: Transform {
                position: spec.position,
                ..Transform::default()
            },
            material: spec.material.clone(),
            parent: None,
            text: None,
        })
    }

    fn insert(&mut self, node: SceneNode) -> NodeId {
        self.next_id += 1;
        self.nodes.insert(self.next_id, node);
        self.next_id
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, node)| node.name == name)
            .map(|(id, _)| *id)
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn children_of(&self, parent: NodeId) -> Vec<NodeId> {
        let mut children: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.parent == Some(parent))
            .map(|(id, _)| *id)
            .collect();
        children.sort_unstable();
        children
    }

    /// Nodes currently added to the scene root
    pub fn visible_nodes(&self) -> Vec<NodeId> {
        self.in_scene.iter().copied().collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl Scene for HeadlessScene {
    fn add_to_scene(&mut self, node: NodeId) {
        if self.nodes.contains_key(&node) {
            self.in_scene.insert(node);
        }
    }

    fn remove_from_scene(&mut self, node: NodeId) {
        self.in_scene.remove(&node);
    }

    fn is_in_scene(&self, node: NodeId) -> bool {
        self.in_scene.contains(&node)
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        if !self.nodes.contains_key(&parent) {
            return;
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(node) = self.nodes.get_mut(&node) {
            node.parent = None;
        }
    }

    fn size_of(&self, node: NodeId) -> Option<Vec3> {
        self.nodes.get(&node).map(|n| n.size)
    }

    fn position_of(&self, node: NodeId) -> Option<Vec3> {
        self.nodes.get(&node).map(|n| n.transform.position)
    }

    fn set_transform(&mut self, node: NodeId, transform: Transform) {
        if let Some(node) = self.nodes.get_mut(&node) {
            node.transform = transform;
        }
    }

    fn set_material(&mut self, node: NodeId, material: &str) {
        if let Some(node) = self.nodes.get_mut(&node) {
            node.material = Some(material.to_string());
        }
    }

    fn create_text(&mut self, text: &str, size: Vec3) -> NodeId {
        self.insert(SceneNode {
            name: format!("text:{text}"),
            size,
            transform: Transform::default(),
            material: None,
            parent: None,
            text: Some(text.to_string()),
        })
    }

    fn remove_node(&mut self, node: NodeId) {
        self.nodes.remove(&node);
        self.in_scene.remove(&node);
        for child in self.nodes.values_mut() {
            if child.parent == Some(node) {
                child.parent = None;
            }
        }
    }
}

/// Linear clip of fixed duration.
#[derive(Debug, Clone)]
pub struct KeyframeClip {
    name: String,
    duration: f32,
    time: f32,
    playing: bool,
}

impl KeyframeClip {
    pub fn new(name: impl Into<String>, duration_seconds: f32) -> Self {
        Self {
            name: name.into(),
            duration: duration_seconds.max(0.0),
            time: 0.0,
            playing: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }
}

impl AnimationClip for KeyframeClip {
    fn play_once(&mut self) {
        self.playing = true;
    }

    fn stop(&mut self) {
        self.playing = false;
    }

    fn set_time(&mut self, seconds: f32) {
        self.time = seconds.clamp(0.0, self.duration);
    }

    fn update(&mut self, delta: Duration) -> bool {
        if !self.playing {
            return false;
        }
        self.time += delta.as_secs_f32();
        if self.time >= self.duration {
            self.time = self.duration;
            self.playing = false;
            return true;
        }
        false
    }
}

/// Scene graph plus the badge rigs found in it.
pub struct LoadedScene {
    pub scene: HeadlessScene,
    pub rigs: HashMap<BadgeKind, BadgeRig>,
}

impl LoadedScene {
    /// Builds the graph from a manifest. Managed badge nodes start outside the scene;
    /// every other node is added right away.
    pub fn from_manifest(manifest: &SceneManifest) -> Result<Self, AssetError> {
        let mut scene = HeadlessScene::new();
        let managed: Vec<&str> = BadgeKind::all().iter().map(BadgeKind::node_name).collect();

        for spec in &manifest.nodes {
            let id = scene.insert_node(spec);
            if !managed.contains(&spec.name.as_str()) {
                scene.add_to_scene(id);
            }
        }

        for clip in &manifest.animations {
            if scene.find(&clip.target).is_none() {
                return Err(AssetError::MissingNode {
                    clip: clip.name.clone(),
                    node: clip.target.clone(),
                });
            }
        }

        let mut rigs = HashMap::new();
        for kind in BadgeKind::all() {
            let node = scene.find(kind.node_name());
            let clip = manifest
                .animations
                .iter()
                .find(|c| c.name == kind.animation_name() && c.target == kind.node_name());
            match (node, clip) {
                (Some(node), Some(clip)) => {
                    log::debug!("Found {} badge rig ({}s clip)", kind, clip.duration_seconds);
                    let clip = KeyframeClip::new(clip.name.clone(), clip.duration_seconds);
                    rigs.insert(*kind, BadgeRig::new(node, Box::new(clip)));
                }
                _ => log::warn!(
                    "Scene has no {} badge ({} / {})",
                    kind,
                    kind.node_name(),
                    kind.animation_name()
                ),
            }
        }

        Ok(Self { scene, rigs })
    }
}

/// Reads and builds the scene manifest without blocking the runtime thread.
pub async fn load_scene(path: impl AsRef<Path>) -> Result<LoadedScene, AssetError> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let manifest: SceneManifest =
        serde_json::from_str(&content).map_err(|source| AssetError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    log::info!(
        "Loaded scene {:?}: {} nodes, {} animations",
        path,
        manifest.nodes.len(),
        manifest.animations.len()
    );
    LoadedScene::from_manifest(&manifest)
}
