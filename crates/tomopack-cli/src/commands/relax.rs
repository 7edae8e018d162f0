use crate::cli::RelaxArgs;
use crate::error::{CliError, Result};
use crate::progress::ProgressBridge;
use crate::scene::{BuiltScene, SceneFile};
use std::path::Path;
use tomopack::core::utils::euler::DEGREES;
use tomopack::engine::progress::{CancelToken, ProgressReporter};
use tomopack::workflows::relax::{self, TerminalState};
use tracing::info;

pub fn run(args: RelaxArgs) -> Result<()> {
    info!("Loading scene from {:?}", &args.scene);
    let mut scene = SceneFile::load(&args.scene)?;
    apply_overrides(&mut scene, &args);

    let mut built = scene.build()?;
    info!(
        lists = built.lists.len(),
        particles = built.system.particle_count(),
        "Scene materialized."
    );

    let bridge = ProgressBridge::new();
    let reporter = ProgressReporter::with_callback(bridge.callback());
    let cancel = CancelToken::new();

    println!("Starting overlap relaxation...");
    let list_ids: Vec<_> = built.lists.iter().map(|&(_, id)| id).collect();
    let report = relax::run(
        &mut built.system,
        &list_ids,
        &built.meshes,
        &built.models,
        &built.constraints,
        &built.config,
        &reporter,
        &cancel,
    )?;

    let verdict = match report.state {
        TerminalState::Converged => "converged",
        TerminalState::IterationLimitReached => "stopped at the iteration limit",
        TerminalState::Cancelled => "was cancelled",
    };
    println!(
        "Relaxation {} after {} iteration(s); final overlap {:.4}.",
        verdict, report.iterations, report.final_overlap
    );

    if let Some(output) = &args.output {
        write_particle_table(output, &built)?;
        println!("✓ Particle table written to: {}", output.display());
    }

    Ok(())
}

fn apply_overrides(scene: &mut SceneFile, args: &RelaxArgs) {
    if let Some(method) = args.method {
        scene.relax.method = method.into();
    }
    if let Some(max_iterations) = args.max_iterations {
        scene.relax.max_iterations = max_iterations;
    }
    if let Some(precision) = args.precision {
        scene.relax.precision = precision;
    }
    if let Some(thoroughness) = args.thoroughness {
        scene.relax.thoroughness = thoroughness;
    }
}

/// Writes the relaxed particles as `list,index,x,y,z,rot,tilt,psi` with
/// angles in degrees.
fn write_particle_table(path: &Path, built: &BuiltScene) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    writer
        .write_record(["list", "index", "x", "y", "z", "rot", "tilt", "psi"])
        .map_err(|e| CliError::Other(e.into()))?;

    for (name, list) in &built.lists {
        for (index, (_, particle)) in built.system.particles_of(*list).enumerate() {
            let [rot, tilt, psi] = particle.euler_angles(DEGREES);
            writer
                .write_record([
                    name.as_str(),
                    &index.to_string(),
                    &format!("{:.6}", particle.position.x),
                    &format!("{:.6}", particle.position.y),
                    &format!("{:.6}", particle.position.z),
                    &format!("{:.6}", rot),
                    &format!("{:.6}", tilt),
                    &format!("{:.6}", psi),
                ])
                .map_err(|e| CliError::Other(e.into()))?;
        }
    }
    writer.flush()?;
    Ok(())
}
