// Spawns the stateful mock API used by the integration tests, for runs of the
// harness binary against it.
// Build with: cargo build --bin spawn_mock_api --features e2e-tests

#[cfg(feature = "e2e-tests")]
#[allow(dead_code)]
mod mock_api {
    // The path is relative to this file
    include!("../../tests/api/mock_api.rs");
}

#[cfg(feature = "e2e-tests")]
use mock_api::{MockApi, MockFlavor};
#[cfg(feature = "e2e-tests")]
use std::io::{self, Write};

#[cfg(feature = "e2e-tests")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // `MOCK_FLAVOR` selects the status codes, `lenient` unless specified.
    let flavor_name = std::env::var("MOCK_FLAVOR").unwrap_or_else(|_| "lenient".into());
    let flavor = MockFlavor::from_name(&flavor_name).ok_or_else(|| {
        format!(
            "{} is not a supported mock flavor. Use either `lenient` or `strict`.",
            flavor_name
        )
    })?;

    let mock_api = MockApi::start(flavor).await;

    let output = serde_json::json!({
        "address": mock_api.address(),
        "port": mock_api.port(),
        "flavor": flavor_name
    });
    println!("{}", serde_json::to_string(&output)?);
    io::stdout().flush()?;

    // Serve until interrupted
    tokio::signal::ctrl_c().await?;

    Ok(())
}

#[cfg(not(feature = "e2e-tests"))]
fn main() {
    eprintln!("This binary requires the 'e2e-tests' feature to be enabled.");
    eprintln!("Build with: cargo build --bin spawn_mock_api --features e2e-tests");
    std::process::exit(1);
}
