// Badge visuals.
//
// Architecture:
// - scene.rs: interfaces of the scene/animation subsystems and vector math
// - placement.rs: geometry for laying the display name onto a badge
// - font.rs: typeface loading and text measurement
// - headless.rs: in-process scene graph and clips built from a scene manifest
// - controller.rs: the Idle/Showing state machine owning the active badge

pub mod controller;
pub mod font;
pub mod headless;
pub mod placement;
pub mod scene;
