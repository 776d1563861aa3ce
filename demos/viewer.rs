//! Interactive OBJ viewer.
//!
//! ```text
//! cargo run --example viewer -- path/to/model.obj [path/to/skybox.obj]
//! ```
//!
//! The model is shown twice, the second copy parented under the first, to
//! exercise shared render objects and transform propagation. Arrows/WASD move,
//! E/Q or right shift/ctrl rise and sink, the mouse looks around, Escape quits.

use std::sync::Arc;

use anyhow::Context;
use arbor::prelude::*;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let model_path = args
        .next()
        .context("usage: viewer <model.obj> [skybox.obj]")?;
    let skybox_path = args.next();

    let config = AppConfig::default().with_title(&format!("Arbor - {}", model_path));

    ArborApp::new(config).run(move |renderer| {
        let model = Arc::new(
            RenderObject::load_obj(&model_path, &PnmDecoder)
                .with_context(|| format!("failed to load {}", model_path))?,
        );
        for warning in model.import_warnings() {
            log::warn!("{}: {}", model_path, warning);
        }

        let scene = renderer.scene_mut();
        let root = scene.insert(SceneNode::group());

        if let Some(skybox_path) = &skybox_path {
            let sky = Arc::new(
                RenderObject::load_obj(skybox_path, &PnmDecoder)
                    .with_context(|| format!("failed to load {}", skybox_path))?,
            );
            let sky_node = scene.insert(SceneNode::skybox(sky, ShaderProgram::skybox()));
            scene.add_child(root, sky_node)?;
        }

        let original = scene.insert(SceneNode::new(
            Some(model.clone()),
            ShaderProgram::textured(),
        ));
        scene.add_child(root, original)?;

        let mut offset = Transform::identity();
        offset
            .translate(2.5, 0.0, 0.0)
            .rotate(45.0, Vector3::unit_y())
            .scale(0.5, 0.5, 0.5);
        let copy = scene.insert(
            SceneNode::new(Some(model), ShaderProgram::textured()).with_transform(offset),
        );
        scene.add_child(original, copy)?;

        renderer.set_root(root)?;
        if let Some(camera) = renderer.camera_mut(0) {
            camera.set_eye_position(0.0, 1.0, 6.0);
        }
        Ok(())
    })
}
