use comfy_table::Table;
use std::sync::Arc;

use raffle_core::{
    InMemoryBank, ManualClock, Participant, Raffle, RaffleHandle, Result, SimulatedOracle,
};

use crate::config::NetworkProfile;

/// Drive complete rounds against the simulated oracle and in-memory bank.
///
/// Each round: enter `participants` tickets, fast-forward past the
/// interval, trigger upkeep, draw the oracle's words for the pending
/// request and deliver them. All operations go through a `RaffleHandle`,
/// the same serialization boundary a concurrent host would use.
pub async fn simulate(
    profile: &NetworkProfile,
    participants: usize,
    rounds: u32,
    seed: Option<u8>,
) -> Result<()> {
    let oracle = Arc::new(match seed {
        Some(seed) => SimulatedOracle::with_seed([seed; 32]),
        None => SimulatedOracle::new(),
    });
    let bank = Arc::new(InMemoryBank::new());
    let clock = Arc::new(ManualClock::starting_now());

    let raffle = Raffle::with_clock(
        profile.raffle_config(),
        oracle.clone(),
        bank.clone(),
        clock.clone(),
    )?;
    let handle = RaffleHandle::new(raffle);

    println!(
        "Simulating {} round(s) on '{}' (fee {} units, interval {}s)",
        rounds, profile.name, profile.entry_fee, profile.interval_secs
    );

    for round in 1..=rounds {
        for i in 1..=participants {
            let participant = Participant::new(format!("player-{}", i));
            handle.enter(participant, profile.entry_fee).await?;
        }

        let info = handle.info().await;
        println!(
            "\nRound {}: {} tickets, pool {} units",
            round, info.participant_count, info.pool_balance
        );

        clock.advance(chrono::Duration::seconds(profile.interval_secs as i64 + 1));
        if !handle.check_upkeep().await.needed {
            println!("Upkeep not yet needed, skipping round");
            continue;
        }

        let request_id = handle.perform_upkeep().await?;
        println!("Randomness request {} submitted", request_id);

        let words = oracle.draw_words(request_id)?;
        tracing::debug!("Oracle delivered {:?} for request {}", words, request_id);

        let winner = handle.fulfill_random_words(request_id, &words).await?;
        println!("Winner: {}", winner);
    }

    print_balances(&bank, participants);
    Ok(())
}

fn print_balances(bank: &InMemoryBank, participants: usize) {
    let mut table = Table::new();
    table.set_header(vec!["Participant", "Winnings (units)"]);

    for i in 1..=participants {
        let participant = Participant::new(format!("player-{}", i));
        let balance = bank.balance_of(&participant);
        table.add_row(vec![participant.to_string(), balance.to_string()]);
    }

    println!("\n{}", table);
}

pub fn show_profiles(profiles: &[NetworkProfile]) {
    let mut table = Table::new();
    table.set_header(vec![
        "Name",
        "Entry fee",
        "Interval (s)",
        "Routing key",
        "Subscription",
        "Confirmations",
        "Callback gas",
    ]);

    for profile in profiles {
        table.add_row(vec![
            profile.name.clone(),
            profile.entry_fee.to_string(),
            profile.interval_secs.to_string(),
            profile.routing_key.clone(),
            profile.subscription_id.to_string(),
            profile.confirmation_depth.to_string(),
            profile.callback_gas_limit.to_string(),
        ]);
    }

    println!("{}", table);
}
