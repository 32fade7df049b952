//! Sprite Viewer
//!
//! Loads a sprite, sprite group or tile sheet definition and prints what drawing it
//! once would send to the renderer:
//! - Tile sheets list their strips and frames
//! - Sprites and groups are attached to a scene node and drawn in isolation
//!
//! Usage: `sprite_viewer <definition> [settings.toml|settings.ron]`

use sprite_engine::assets::Properties;
use sprite_engine::config::{Config, ConfigError, SpriteSettings};
use sprite_engine::render::{BatchCommand, Camera, RecordingRenderer};
use sprite_engine::scene::Scene;
use sprite_engine::sprites::{LoadError, ResourceCatalog};
use sprite_engine::foundation::math::Vec3;

use thiserror::Error;

// Orthographic view used for culling
const VIEW_WIDTH: f32 = 1280.0;
const VIEW_HEIGHT: f32 = 720.0;

#[derive(Error, Debug)]
enum ViewerError {
    #[error("usage: sprite_viewer <definition> [settings.toml|settings.ron]")]
    Usage,

    #[error("settings: {0}")]
    Settings(#[from] ConfigError),

    #[error("load: {0}")]
    Load(#[from] LoadError),
}

fn main() {
    sprite_engine::foundation::logging::init();

    if let Err(e) = run() {
        log::error!("{}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), ViewerError> {
    let mut args = std::env::args().skip(1);
    let definition = args.next().ok_or(ViewerError::Usage)?;
    let settings = match args.next() {
        Some(path) => SpriteSettings::load_from_file(&path)?,
        None => SpriteSettings::default(),
    };

    let catalog = ResourceCatalog::with_file_source(settings);
    let properties = Properties::load(&definition, catalog.source()).map_err(LoadError::from)?;
    let namespace = properties.definition().map(|p| p.namespace().to_string()).unwrap_or_default();

    if namespace == "tilesheet" {
        print_tile_sheet(&catalog, &definition)
    } else {
        draw_once(&catalog, &definition)
    }
}

fn print_tile_sheet(catalog: &ResourceCatalog, url: &str) -> Result<(), ViewerError> {
    let sheet = catalog.load_tile_sheet(url)?;
    let texture = sheet.texture();
    println!("tilesheet '{}' ({} {}x{})", sheet.id(), texture.path, texture.width, texture.height);

    for (index, strip) in sheet.strips().iter().enumerate() {
        println!("  strip {} '{}' ({} frames)", index, strip.id(), strip.frame_count());
        for (frame, rect) in strip.frames().iter().enumerate() {
            println!("    {:>3}: {:?}", frame, rect);
        }
    }
    Ok(())
}

fn draw_once(catalog: &ResourceCatalog, url: &str) -> Result<(), ViewerError> {
    let drawable = catalog.load_drawable(url)?;

    let mut scene = Scene::new();
    let node = scene.create_node("viewer");
    scene.set_drawable(node, Some(drawable.clone()));
    scene.set_active_camera(Some(Camera::orthographic(
        Vec3::new(VIEW_WIDTH * 0.5, VIEW_HEIGHT * 0.5, 10.0),
        VIEW_WIDTH,
        VIEW_HEIGHT,
        0.1,
        100.0,
    )));

    let mut renderer = RecordingRenderer::new();
    let drawn = scene.draw(&mut renderer);
    log::info!("'{}' drew {} quads", drawable.borrow().id(), drawn);

    for command in renderer.commands() {
        match command {
            BatchCommand::Start(batch) => println!("start    {:?}", batch),
            BatchCommand::SetProjection(batch, _) => println!("project  {:?}", batch),
            BatchCommand::Draw(batch, quad) => println!(
                "draw     {:?} at ({:.1}, {:.1}) size ({:.1}, {:.1}) src {:?}",
                batch, quad.position.x, quad.position.y, quad.size.x, quad.size.y, quad.source
            ),
            BatchCommand::Finish(batch) => println!("finish   {:?}", batch),
        }
    }
    Ok(())
}
