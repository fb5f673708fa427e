//! Headless demo: a ring of cubes, three light types, two layers
//!
//! Builds a small scene against the recording backend, runs a fixed
//! number of frames through the engine loop, and logs per-frame stats.
//! Run with `RUST_LOG=debug` to watch shader permutations being
//! assembled and layers adopting the default camera.

use lumen_engine::prelude::*;

const FRAMES: u32 = 60;

const SETTINGS: &str = r#"
[shading]
max_point_lights = 4
shadow_map_resolution = 256
light_cull_threshold = 0.001
"#;

fn main() {
    env_logger::init();

    let mut engine = match Engine::headless_with_settings(SETTINGS) {
        Ok(engine) => engine,
        Err(e) => {
            log::error!("engine startup failed: {e}");
            std::process::exit(1);
        }
    };

    let camera_rig = engine.scene.create_object("camera_rig");
    if let Some(t) = engine.scene.transform_mut(camera_rig) {
        t.position = Vec3::new(0.0, 3.0, 8.0);
    }
    let camera = engine
        .renderer
        .add_camera(Camera::default().with_object(camera_rig));

    let world_layer = engine.renderer.create_layer("world");
    if let Some(layer) = engine.renderer.layer_mut(world_layer) {
        layer.set_camera(camera);
    }
    // The overlay draws the world layer's content again on top.
    let overlay_layer = engine.renderer.create_layer("overlay");
    if let Some(layer) = engine.renderer.layer_mut(overlay_layer) {
        layer.bind_layer(world_layer);
    }

    let mesh = engine
        .context
        .resources
        .get_mesh("unit_cube", || Ok(Mesh::cube("unit_cube", 1.0)));
    let material = engine
        .context
        .resources
        .get_material("cube_phong", || Ok(Material::new("cube_phong").with_phong()));

    let mut spinners = Vec::new();
    for i in 0..6 {
        let angle = (i as f32) * std::f32::consts::TAU / 6.0;
        let object = engine.scene.create_object(format!("cube_{i}"));
        if let Some(t) = engine.scene.transform_mut(object) {
            t.position = Vec3::new(angle.cos() * 3.0, 0.0, angle.sin() * 3.0);
        }
        spinners.push(object);

        let mut drawable = Drawable::new(object, format!("cube_{i}"));
        drawable.set_model(Model::new(&mesh, material.clone()));
        drawable.set_color(Color::new(40 * i as u8 + 55, 128, 200, 255));
        let key = engine.renderer.add_drawable(drawable);
        engine.renderer.add_drawable_to_layer(world_layer, key);
    }

    let lamp_obj = engine.scene.create_object("lamp");
    if let Some(t) = engine.scene.transform_mut(lamp_obj) {
        t.position = Vec3::new(0.0, 2.5, 0.0);
    }
    let mut lamp = LightSource::new(lamp_obj, "lamp", LightType::Point);
    lamp.set_intensity(IntensitySlot::Diffuse, Color::WHITE);
    lamp.set_attenuation(1.0, 4.5, 75.0);
    lamp.set_cast_shadows(true, engine.context.backend.as_mut(), engine.context.shadow_resolution);
    engine.renderer.add_light(lamp);

    let sun_obj = engine.scene.create_object("sun");
    let mut sun = LightSource::new(sun_obj, "sun", LightType::Directional);
    sun.set_intensity_all(Color::new(200, 200, 180, 255));
    engine.renderer.add_light(sun);

    let spot_obj = engine.scene.create_object("spot");
    if let Some(t) = engine.scene.transform_mut(spot_obj) {
        t.position = Vec3::new(4.0, 4.0, 0.0);
    }
    let mut spot = LightSource::new(spot_obj, "spot", LightType::Spot);
    spot.set_cutoff(0.3, 0.45);
    spot.set_attenuation_from_range(12.0);
    engine.renderer.add_light(spot);

    log::info!(
        "scene ready: {} drawables, {} lights, {FRAMES} frames",
        engine.renderer.drawable_count(),
        engine.renderer.light_count()
    );

    let mut total_draws = 0;
    let mut total_shadow_maps = 0;
    for _ in 0..FRAMES {
        let stats = engine.frame(
            |_, _| {},
            |scene, delta| {
                for object in &spinners {
                    if let Some(transform) = scene.transform_mut(*object) {
                        let spin = Quat::from_axis_angle(&Vec3::y_axis(), delta * 0.8);
                        transform.rotation = spin * transform.rotation;
                    }
                }
            },
        );
        total_draws += stats.draw_calls;
        total_shadow_maps += stats.shadow_maps_drawn;
    }

    log::info!(
        "done: {} frames, {total_draws} draw calls, {total_shadow_maps} shadow maps",
        engine.frame_count()
    );
    println!(
        "{} frames, {total_draws} draw calls, {total_shadow_maps} shadow maps",
        engine.frame_count()
    );
}
