//! A lake with a rocking boat, a ring of trees, cars driving around and a
//! sun going up and down.
//!
//! Assets are looked up under `./assets`, run from this directory.

use std::{sync::Arc, time::Duration};

use rand::Rng;
use scene_ngin::{
    DeviceEvent, Vector2, Vector3, WindowEvent,
    animation::{DayCycle, Oscillator, Path, Traffic, day_cycle::SUN, ring_points},
    config::ViewerConfig,
    context::{Context, InitContext},
    data_structures::{
        mesh::Mesh,
        plane::{Plane, TexCoordScale},
        texture::{CubeTexture, Texture},
    },
    flow::{self, FlowConstructor, GraphicsFlow},
    lights::DirectionalLight,
    render::Render,
    resources::{ImportedMesh, load_cube_map, load_model, load_texture},
};

const SKYBOX: [&str; 6] = [
    "textures/skybox/right.jpg",
    "textures/skybox/left.jpg",
    "textures/skybox/top.jpg",
    "textures/skybox/bottom.jpg",
    "textures/skybox/front.jpg",
    "textures/skybox/back.jpg",
];
const CARS: usize = 15;
const TREES: usize = 400;

fn unit_plane(scale: Vector3<f32>) -> Plane {
    Plane::new(
        [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, -1.0),
            Vector3::new(1.0, 0.0, -1.0),
            Vector3::new(1.0, 0.0, 0.0),
        ],
        scale,
    )
}

fn textured(
    mut plane: Plane,
    texture: &Arc<Texture>,
    position: Vector3<f32>,
    y_rotation: f32,
    ctx: &InitContext,
) -> Plane {
    plane
        .add_texture(texture.clone())
        .set_position(position)
        .set_rotation(Vector3::new(0.0, y_rotation, 0.0))
        .compile(ctx);
    plane
}

fn textured_mesh(
    parts: &[ImportedMesh],
    texture: &Arc<Texture>,
    label: &str,
) -> anyhow::Result<Mesh> {
    let mut mesh = Mesh::from_imported(parts.to_vec())?.with_label(label);
    mesh.add_texture(texture.clone());
    Ok(mesh)
}

struct Ground {
    planes: Vec<Plane>,
    markers: Vec<Plane>,
}

impl Ground {
    async fn new(ctx: &InitContext) -> anyhow::Result<Self> {
        let (water, water_spec, blend, blend_angle, grass) = futures::try_join!(
            load_texture("textures/Water_002_COLOR.png", &ctx.device, &ctx.queue),
            load_texture("textures/Water_001_SPEC.png", &ctx.device, &ctx.queue),
            load_texture("textures/sand_and_grass_blend.png", &ctx.device, &ctx.queue),
            load_texture("textures/sand_and_grass_blend_angle.png", &ctx.device, &ctx.queue),
            load_texture("textures/grass.png", &ctx.device, &ctx.queue),
        )?;

        let mut planes = Vec::new();

        let mut lake = unit_plane(Vector3::new(60.0, 60.0, 60.0)).with_label("water");
        lake.add_texture(water)
            .add_texture(water_spec)
            .set_position(Vector3::new(-30.0, -1.3, 30.0))
            .compile(ctx);
        planes.push(lake);

        for rotation in [0.0, 180.0, 90.0, 270.0] {
            let shore = unit_plane(Vector3::new(60.0, 60.0, 30.0)).with_label("shore");
            planes.push(textured(shore, &blend, Vector3::new(-30.0, 0.0, 60.0), rotation, ctx));
        }
        for rotation in [0.0, 90.0, 180.0, 270.0] {
            let corner = unit_plane(Vector3::new(30.0, 30.0, 30.0)).with_label("shore corner");
            planes.push(textured(
                corner,
                &blend_angle,
                Vector3::new(-60.0, 0.0, 60.0),
                rotation,
                ctx,
            ));
        }

        let wide = TexCoordScale::Fixed(Vector2::new(8.0, 24.0));
        let narrow = TexCoordScale::Fixed(Vector2::new(24.0, 8.0));
        for rotation in [0.0, 180.0] {
            let field = unit_plane(Vector3::new(600.0, 600.0, 600.0))
                .with_label("grass")
                .with_tex_coord_scale(wide);
            planes.push(textured(field, &grass, Vector3::new(-660.0, 0.0, 300.0), rotation, ctx));
            let strip = unit_plane(Vector3::new(120.0, 600.0, 400.0))
                .with_label("grass")
                .with_tex_coord_scale(narrow);
            planes.push(textured(strip, &grass, Vector3::new(-60.0, 0.0, -60.0), rotation, ctx));
        }

        // red road markers along the outer lane
        let lane = road(180.0);
        let markers = lane
            .points
            .iter()
            .enumerate()
            .step_by(40)
            .map(|(i, point)| {
                let at = Vector3::new(point.x, 0.01, point.z);
                let mut marker = unit_plane(Vector3::new(15.0, 10.0, 30.0)).with_label("marker");
                marker
                    .set_color(Vector3::new(1.0, 0.0, 0.0))
                    .set_position(at)
                    .set_origin(at)
                    .set_rotation(Vector3::new(0.0, lane.rotation_at(i), 0.0))
                    .compile(ctx);
                marker
            })
            .collect();

        Ok(Self { planes, markers })
    }
}

fn road(radius: f32) -> Path {
    Path::new(ring_points(Vector3::new(0.0, 0.0, 0.0), radius, 9000), true, -0.04, 90.0)
}

impl GraphicsFlow for Ground {
    fn on_init(&mut self, _: &mut Context) {}

    fn on_update(&mut self, _: &mut Context, _: Duration) {}

    fn on_tick(&mut self, _: &mut Context) {}

    fn on_window_events(&mut self, _: &Context, _: &WindowEvent) {}

    fn on_device_events(&mut self, _: &Context, _: &DeviceEvent) {}

    fn on_render(&self) -> Render<'_> {
        Render::Composed(vec![
            self.planes.as_slice().into(),
            self.markers.as_slice().into(),
        ])
    }
}

struct Lake {
    scenery: Vec<Mesh>,
    boat: Mesh,
    rocking: Oscillator,
    traffic: Traffic<Mesh>,
    sky: Option<CubeTexture>,
    day: DayCycle,
}

impl Lake {
    async fn new(ctx: &InitContext) -> anyhow::Result<Self> {
        let (mountain_tex, sand, wood, car_1_tex, car_2_tex) = futures::try_join!(
            load_texture("textures/mountain.png", &ctx.device, &ctx.queue),
            load_texture("textures/sand.png", &ctx.device, &ctx.queue),
            load_texture("textures/wood.png", &ctx.device, &ctx.queue),
            load_texture("textures/Car Texture 1.png", &ctx.device, &ctx.queue),
            load_texture("textures/Car Texture 2.png", &ctx.device, &ctx.queue),
        )?;
        let (mountain, lake_bed, boat, tree, car_1, car_2) = futures::try_join!(
            load_model("models/mountain.obj"),
            load_model("models/lake.obj"),
            load_model("models/boat.obj"),
            load_model("models/lowpolytree.obj"),
            load_model("models/car_1.obj"),
            load_model("models/car_2.obj"),
        )?;
        let sky = load_cube_map(SKYBOX, &ctx.device, &ctx.queue).await?;

        let mut scenery = Vec::with_capacity(TREES + 4);

        let mut peak = textured_mesh(&mountain, &mountain_tex, "mountain")?;
        peak.set_scale(Vector3::new(0.2, 1.0, 0.2))
            .set_position(Vector3::new(196.0, 10.0, -173.0))
            .set_rotation(Vector3::new(180.0, 43.0, 0.0))
            .compile(ctx);
        scenery.push(peak);

        let mut ridge = textured_mesh(&mountain, &mountain_tex, "mountain")?;
        ridge
            .set_scale(Vector3::new(0.2, 1.2, 0.45))
            .set_position(Vector3::new(289.0, 10.0, -88.0))
            .set_rotation(Vector3::new(180.0, 245.0, 0.0))
            .compile(ctx);
        scenery.push(ridge);

        let mut bed = textured_mesh(&lake_bed, &sand, "lake bed")?;
        bed.set_scale(Vector3::new(0.1, 0.1, 0.1))
            .set_position(Vector3::new(0.0, -0.011, 0.0))
            .compile(ctx);
        scenery.push(bed);

        let mut moored = textured_mesh(&boat, &wood, "moored boat")?;
        moored
            .set_scale(Vector3::new(0.3, 0.3, 0.3))
            .set_position(Vector3::new(20.0, -1.5, 0.0))
            .set_origin(Vector3::new(20.0, -1.5, 0.0))
            .set_rotation(Vector3::new(10.0, 90.0, 0.0))
            .compile(ctx);
        scenery.push(moored);

        let mut rng = rand::rng();
        for spot in ring_points(Vector3::new(0.0, 0.0, 0.0), 100.0, TREES) {
            let scale = rng.random_range(0.5..2.5);
            // small trees sink less into the ground
            let lift = if scale >= 1.0 { 1.0 } else { 0.3 };
            let mut tree = Mesh::from_imported(tree.clone())?.with_label("tree");
            tree.set_position(Vector3::new(
                spot.x + rng.random_range(-30.0..30.0),
                spot.y + scale + lift,
                spot.z + rng.random_range(-30.0..30.0),
            ))
            .set_scale(Vector3::new(scale, scale, scale))
            .compile(ctx);
            scenery.push(tree);
        }

        let mut rocking_boat = textured_mesh(&boat, &wood, "boat")?;
        rocking_boat
            .set_scale(Vector3::new(0.3, 0.3, 0.3))
            .set_position(Vector3::new(0.0, -1.3, 0.0))
            .set_origin(Vector3::new(0.0, -1.3, 0.0))
            .set_rotation(Vector3::new(0.0, 70.0, 0.0))
            .compile(ctx);

        let mut traffic = Traffic::new();
        let lanes = [
            traffic.add_path(Path::new(
                ring_points(Vector3::new(0.0, 0.0, 0.0), 155.0, 18000),
                true,
                -0.02,
                90.0,
            )),
            traffic.add_path(Path::new(
                ring_points(Vector3::new(0.0, 0.0, 0.0), 160.0, 9000),
                true,
                -0.04,
                90.0,
            )),
        ];
        for i in 0..CARS {
            let (model, texture) = if rng.random_bool(0.5) {
                (&car_1, &car_1_tex)
            } else {
                (&car_2, &car_2_tex)
            };
            let mut car = textured_mesh(model, texture, &format!("car {i}"))?;
            car.compile(ctx);
            let lane = lanes[rng.random_range(0..lanes.len())];
            let start = rng.random_range(0..traffic.paths()[lane].len());
            traffic.add_vehicle(car, lane, start)?;
        }

        Ok(Self {
            scenery,
            boat: rocking_boat,
            rocking: Oscillator::default(),
            traffic,
            sky: Some(sky),
            day: DayCycle::new(SUN),
        })
    }
}

impl GraphicsFlow for Lake {
    fn on_init(&mut self, ctx: &mut Context) {
        ctx.lights.add_light(DirectionalLight::new(
            SUN,
            Vector3::new(75.0, 0.0, 0.0),
            Vector3::new(0.1, 0.1, 0.1),
            Vector3::new(1.0, 0.5, 0.3),
            Vector3::new(1.0, 0.5, 0.3),
        ));
        if let Some(sky) = self.sky.take() {
            ctx.set_skybox(sky, Some(0.3));
        }
    }

    fn on_update(&mut self, _: &mut Context, _: Duration) {}

    fn on_tick(&mut self, ctx: &mut Context) {
        let tilt = self.rocking.tick();
        self.boat.set_rotation(Vector3::new(tilt, 70.0, tilt));
        self.traffic.tick();
        let sun = self.day.apply(ctx);
        log::trace!("sun at {:.3}: {:?}", self.day.rotation(), sun.direction);
    }

    fn on_window_events(&mut self, _: &Context, _: &WindowEvent) {}

    fn on_device_events(&mut self, _: &Context, _: &DeviceEvent) {}

    fn on_render(&self) -> Render<'_> {
        Render::Composed(vec![
            self.scenery.as_slice().into(),
            self.traffic.render(),
            (&self.boat).into(),
        ])
    }
}

fn main() -> anyhow::Result<()> {
    let ground: FlowConstructor = Box::new(|ctx| {
        Box::pin(async move { Ok(Box::new(Ground::new(&ctx).await?) as Box<dyn GraphicsFlow>) })
    });
    let lake: FlowConstructor = Box::new(|ctx| {
        Box::pin(async move { Ok(Box::new(Lake::new(&ctx).await?) as Box<dyn GraphicsFlow>) })
    });

    let config = ViewerConfig::default()
        .with_title("lake")
        .with_size(1280, 720);
    flow::run(config, vec![ground, lake])
}
