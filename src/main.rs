/*
 * Responsibility
 * - tokio runtime entry point
 * - calls app::run() (no logic here)
 */
use anyhow::Result;

use authn_webhook::app;

#[tokio::main]
async fn main() -> Result<()> {
    app::run().await
}
