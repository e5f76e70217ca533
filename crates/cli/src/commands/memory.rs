//! `crewloop memory`: Show recorded memory rows.

use crewloop_core::identity::{StaticIdentity, resolve_user_id};
use crewloop_memory::{MemoryRecorder, open_store};

use super::{format_record, load_config};

pub async fn run(limit: Option<usize>, user: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let limit = limit.unwrap_or(config.memory.fetch_limit);

    let identity = StaticIdentity(user.or_else(|| config.identity.user_id.clone()));
    let user_id = resolve_user_id(&identity, &config.identity.fallback_user_id).await;

    let store = open_store(&config.memory).await?;
    let total = store.count(&user_id).await.ok();
    let recorder = MemoryRecorder::new(store);
    let rows = recorder.fetch(&user_id, limit).await;

    println!("🧠 Memory for {user_id}");
    println!("====================");
    println!("  Backend:  {}", config.memory.backend);
    match total {
        Some(total) => println!("  Rows:     {} of {total}\n", rows.len()),
        None => println!("  Rows:     {}\n", rows.len()),
    }

    if rows.is_empty() {
        println!("   No memories recorded yet. Try `crewloop run \"<goal>\"`.");
    }
    for row in &rows {
        println!("{}", format_record(row));
    }

    Ok(())
}
