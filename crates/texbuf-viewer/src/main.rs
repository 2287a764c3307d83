use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;

use texbuf_engine::camera::CameraConfig;
use texbuf_engine::device::GpuInit;
use texbuf_engine::logging::{init_logging, LoggingConfig};
use texbuf_engine::render::shader::{read_source, CompiledUnit, ShaderStage};
use texbuf_engine::render::shaders::{MESH_FRAGMENT_WGSL, MESH_VERTEX_WGSL};
use texbuf_engine::window::{Runtime, RuntimeConfig};
use texbuf_obj::Mesh;

mod viewer;

use viewer::Viewer;

const DEFAULT_MODEL: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/heightmap.obj");

#[derive(Parser)]
#[command(name = "texbuf-viewer")]
#[command(version, about = "Orbiting viewer for .obj meshes drawn from buffer-textures")]
struct Cli {
    /// Model file (`v x y z` / `f a b c` records).
    #[arg(default_value = DEFAULT_MODEL)]
    model: PathBuf,

    /// Vertex-stage WGSL file. Uses the built-in shader when omitted.
    #[arg(long)]
    vertex: Option<PathBuf>,

    /// Fragment-stage WGSL file. Uses the built-in shader when omitted.
    #[arg(long)]
    fragment: Option<PathBuf>,

    /// Present frames as soon as they are ready instead of once per vblank.
    #[arg(long)]
    no_vsync: bool,

    /// Log filter in env_logger syntax; overrides RUST_LOG.
    #[arg(long)]
    log: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(LoggingConfig {
        env_filter: cli.log.clone(),
        ..Default::default()
    });

    let mesh = load_mesh(&cli.model);

    // A shader that does not compile is fatal.
    let vertex = compile_stage(cli.vertex.as_deref(), MESH_VERTEX_WGSL, ShaderStage::Vertex)?;
    let fragment =
        compile_stage(cli.fragment.as_deref(), MESH_FRAGMENT_WGSL, ShaderStage::Fragment)?;

    let config = RuntimeConfig {
        title: "Oh look a heightmap!".to_string(),
        ..Default::default()
    };

    let gpu_init = GpuInit {
        swap_interval: if cli.no_vsync { 0 } else { 1 },
        ..Default::default()
    };

    let viewer = Viewer::new(mesh, vertex, fragment, CameraConfig::default());
    Runtime::run(config, gpu_init, viewer)?.finish()
}

/// Loads the model, falling back to an empty mesh if the file is unusable.
fn load_mesh(path: &Path) -> Mesh {
    match texbuf_obj::load(path) {
        Ok(mesh) => {
            log::info!(
                "loaded {}: {} positions, {} triangles",
                path.display(),
                mesh.position_count(),
                mesh.triangle_count()
            );
            if let Some(stop) = &mesh.truncated {
                log::warn!("{}: {stop}; keeping the records before it", path.display());
            }
            let bad = mesh.out_of_range_indices();
            if bad > 0 {
                log::warn!("{bad} face indices reference missing positions; output will be wrong");
            }
            mesh
        }
        Err(e) => {
            log::error!("{e}; continuing with an empty mesh");
            Mesh::default()
        }
    }
}

fn compile_stage(
    path: Option<&Path>,
    builtin: &str,
    stage: ShaderStage,
) -> anyhow::Result<CompiledUnit> {
    let (label, source) = match path {
        Some(p) => (p.display().to_string(), read_source(p)?),
        None => (format!("builtin {stage}"), builtin.to_string()),
    };
    CompiledUnit::compile(label, source, stage)
        .with_context(|| format!("{stage} shader is unusable"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_degrades_to_empty_mesh() {
        let mesh = load_mesh(Path::new("no/such/model.obj"));
        assert!(mesh.positions.is_empty());
        assert_eq!(mesh.triangle_count(), 0);
    }

    #[test]
    fn bundled_model_is_well_formed() {
        let mesh = load_mesh(Path::new(DEFAULT_MODEL));
        assert!(mesh.triangle_count() > 0);
        assert_eq!(mesh.out_of_range_indices(), 0);
        assert!(mesh.truncated.is_none());
    }

    #[test]
    fn malformed_model_keeps_leading_records() {
        let path = std::env::temp_dir().join(format!("texbuf-viewer-{}.obj", std::process::id()));
        std::fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n# f stands for face\n").unwrap();
        let mesh = load_mesh(&path);
        let _ = std::fs::remove_file(&path);
        assert_eq!(mesh.triangle_count(), 1);
        assert!(mesh.truncated.is_some());
    }

    #[test]
    fn builtin_shaders_compile() {
        compile_stage(None, MESH_VERTEX_WGSL, ShaderStage::Vertex).unwrap();
        compile_stage(None, MESH_FRAGMENT_WGSL, ShaderStage::Fragment).unwrap();
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["texbuf-viewer"]).unwrap();
        assert_eq!(cli.model, PathBuf::from(DEFAULT_MODEL));
        assert!(cli.vertex.is_none() && cli.fragment.is_none());
        assert!(!cli.no_vsync);
    }

    #[test]
    fn cli_overrides() {
        let cli = Cli::try_parse_from([
            "texbuf-viewer",
            "bunny.obj",
            "--fragment",
            "flat.wgsl",
            "--no-vsync",
        ])
        .unwrap();
        assert_eq!(cli.model, PathBuf::from("bunny.obj"));
        assert_eq!(cli.fragment, Some(PathBuf::from("flat.wgsl")));
        assert!(cli.no_vsync);
    }
}
