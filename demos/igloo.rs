//! Builds an igloo with the reference kernel and prints its bricks.
//!
//! Usage:
//! ```text
//! cargo run --example igloo                      # default layout
//! cargo run --example igloo -- '{"precision":64}' # JSON overrides for DomeConfig
//! RUST_LOG=dome_bricks=debug cargo run --example igloo
//! ```

use std::error::Error;

use dome_bricks::dome::{BatchPolicy, BuildDome, DomeConfig, HollowParams};
use dome_bricks::kernel::PolarKernel;

/// Defaults overridden by the JSON object in `arg`, if any.
fn load_config(arg: Option<&str>) -> Result<DomeConfig, serde_json::Error> {
    arg.map_or_else(|| Ok(DomeConfig::default()), serde_json::from_str)
}

fn main() -> Result<(), Box<dyn Error>> {
    // Default: WARN for everything, INFO for this crate.
    // Override with RUST_LOG env var.
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("igloo=info".parse().unwrap_or_default())
        .add_directive("dome_bricks=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = load_config(std::env::args().nth(1).as_deref())?;
    println!("config: {}", serde_json::to_string(&config)?);

    let kernel = PolarKernel::new();
    let hollow = HollowParams::default().with_policy(BatchPolicy::FailSoft);
    let dome = BuildDome::new(config).with_hollowing(hollow).execute(&kernel)?;

    println!(
        "cap angle {}°, ring cuts {:?}, meridian cuts {:?}",
        dome.plan.cap_angle(),
        dome.plan.polar_angles(),
        dome.plan.azimuth_angles()
    );
    println!("boundary radii {:?}", dome.boundary_radii);
    for piece in &dome.pieces {
        let c = piece.centroid;
        println!(
            "{:>3}  {:<20} centroid ({:+.3}, {:+.3}, {:+.3})  faces {:>5}  volume {:.5}",
            piece.id,
            piece.role.to_string(),
            c.x,
            c.y,
            c.z,
            piece.solid.face_count(),
            kernel.volume(&piece.solid)
        );
    }
    for failure in &dome.failures {
        println!("piece {} ({}) failed: {}", failure.id, failure.role, failure.error);
    }

    let unique: Vec<String> = dome
        .unique_bricks()
        .iter()
        .map(|p| format!("{} ({})", p.id, p.role))
        .collect();
    println!("distinct brick shapes: {}", unique.join(", "));
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn config_argument_overrides_defaults() {
        let config = load_config(Some(r#"{"precision": 64}"#)).unwrap();
        assert_eq!(config.precision, 64);
        assert_eq!(config.radial_brick_count, DomeConfig::default().radial_brick_count);
        assert_eq!(load_config(None).unwrap(), DomeConfig::default());
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(load_config(Some("{precision: 64")).is_err());
        assert!(load_config(Some(r#"{"precision": "many"}"#)).is_err());
    }
}
