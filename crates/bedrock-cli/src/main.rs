//! `bedrock-space` binary

use std::io::Write;

fn main() -> anyhow::Result<()> {
    let matches = bedrock_cli::command().get_matches();
    bedrock_cli::init_tracing(matches.get_flag("log-json"));

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    bedrock_cli::run(&matches, &mut out)?;
    out.flush()?;
    Ok(())
}
