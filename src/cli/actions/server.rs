use crate::cli::{actions::Action, globals::GlobalArgs};
use crate::gardisto;
use anyhow::Result;
use url::Url;

/// Handle the server action
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    match action {
        Action::Server { port, dsn } => {
            // Fail fast on an unparseable DSN instead of deep inside the pool.
            let dsn = Url::parse(&dsn)?;

            gardisto::new(port, dsn.to_string(), globals).await?;
        }
    }

    Ok(())
}
