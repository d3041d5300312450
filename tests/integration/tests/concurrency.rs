//! A single validator shared across threads.

use std::sync::Arc;
use std::thread;

use chrono::Duration;

use rp_saml::{Conditions, ValidationResult};

use crate::common::{TestEnv, SP};

const THREADS: usize = 8;
const ROUNDS: usize = 25;

#[test]
fn shared_validator_gives_consistent_results() -> anyhow::Result<()> {
    let env = Arc::new(TestEnv::new()?);

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let env = Arc::clone(&env);
            thread::spawn(move || -> anyhow::Result<usize> {
                let mut valid = 0;
                for round in 0..ROUNDS {
                    let assertion = env.assertion(&format!("_t{t}_r{round}"))?;
                    let (result, ctx) = env.validate(&assertion, env.params());
                    anyhow::ensure!(
                        result == ValidationResult::Valid,
                        "round {round} on thread {t}: {:?}",
                        ctx.message()
                    );
                    valid += 1;
                }
                Ok(valid)
            })
        })
        .collect();

    let mut total = 0;
    for handle in handles {
        total += handle
            .join()
            .map_err(|_| anyhow::anyhow!("validation thread panicked"))??;
    }
    assert_eq!(total, THREADS * ROUNDS);
    Ok(())
}

#[test]
fn one_time_use_is_enforced_across_threads() -> anyhow::Result<()> {
    let env = Arc::new(TestEnv::new()?);
    let now = env.receive_instant;
    let mut assertion = env.unsigned_assertion("_contended");
    assertion.conditions = Some(
        Conditions::new()
            .valid_between(now - Duration::seconds(1), now + Duration::minutes(5))
            .with_audience(SP)
            .one_time_use(),
    );
    env.idp.sign(&mut assertion)?;
    let assertion = Arc::new(assertion);

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let env = Arc::clone(&env);
            let assertion = Arc::clone(&assertion);
            thread::spawn(move || env.validate(&assertion, env.params()).0)
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        let result = handle
            .join()
            .map_err(|_| anyhow::anyhow!("validation thread panicked"))?;
        if result == ValidationResult::Valid {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 1);
    Ok(())
}
