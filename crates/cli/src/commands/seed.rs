use crate::commands::{build_runtime, load_config, CommandResult};
use packdeal_db::{
    connect_with_config, migrations, DemoSeedDataset, SeedResult, SqlPackRepository,
};

pub fn run() -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(result) => return result,
    };

    let runtime = match build_runtime("seed") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let repository = SqlPackRepository::new(pool.clone());
        let seed_result = DemoSeedDataset::load(&repository)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = DemoSeedDataset::verify(&repository)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result: Result<SeedResult, (&'static str, String, u8)> = if verification.all_present {
            Ok(seed_result)
        } else {
            let failed_checks = verification
                .checks
                .iter()
                .filter_map(|(check, passed)| (!passed).then_some(*check))
                .collect::<Vec<_>>();
            Err(("seed_verification", verification_message(&failed_checks), 6u8))
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(output) => CommandResult::success("seed", render_summary(&output)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn verification_message(failed_checks: &[&str]) -> String {
    if failed_checks.is_empty() {
        "Some demo packs failed to load".to_string()
    } else {
        format!("Seed verification failed for packs: {}", failed_checks.join(", "))
    }
}

fn render_summary(result: &SeedResult) -> String {
    let lines: Vec<String> = result
        .packs
        .iter()
        .map(|pack| {
            let state = if pack.created { "created" } else { "already present" };
            format!("  - {}: {} ({})", pack.name, state, pack.description)
        })
        .collect();
    format!("demo pack set ready ({} created):\n{}", result.created_count(), lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::verification_message;

    #[test]
    fn verification_error_message_targets_failed_checks() {
        assert_eq!(
            verification_message(&["Starter Kit", "Clearance Duo"]),
            "Seed verification failed for packs: Starter Kit, Clearance Duo"
        );
    }

    #[test]
    fn verification_error_message_falls_back_to_generic_when_no_labels() {
        assert_eq!(verification_message(&[]), "Some demo packs failed to load");
    }
}
