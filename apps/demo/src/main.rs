use anyhow::Context;
use herald::Herald;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,herald=debug")),
        )
        .init();

    let bus = Herald::builder()
        .topics(["KITCHEN", "DOORBELL"])
        .request_ttl(Duration::from_millis(500))
        .build()?;

    let topics = bus.topics();
    let kitchen = topics.get("KITCHEN").context("KITCHEN was registered at build time")?;
    let doorbell = topics.get("DOORBELL").context("DOORBELL was registered at build time")?;

    // The kitchen answers every order request on its topic.
    let responder = bus.clone();
    bus.listen(&kitchen, move |payload| {
        if let Some(order) = payload.as_request() {
            info!(query = %order.query, tracking = %order.tracking, "Kitchen took an order");
            responder.respond(&order.tracking, format!("{} ready", order.query));
        }
    })?;

    // A one-shot chime: the second ring finds nobody listening.
    bus.listen_once(&doorbell, |payload| info!(%payload, "Ding-dong"))?;
    bus.say(&doorbell, "first guest")?;
    let scheduled = bus.say(&doorbell, "second guest")?;
    info!(scheduled, "Second ring went nowhere");

    let answer = bus.request(&kitchen, "two espressi").await?;
    info!(%answer, "Order fulfilled");

    // Unanswered requests fail by watchdog, not by hanging.
    bus.cancel(&kitchen)?;
    match bus.request(&kitchen, "one more").await {
        Ok(_) => unreachable!("nobody is listening"),
        Err(err) => info!(%err, "Request timed out as expected"),
    }

    Ok(())
}
