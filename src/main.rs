use std::io::{self, BufWriter};

use anyhow::Context;
use linebuf::{error, Session, SessionOptions};

fn main() -> anyhow::Result<()> {
    error::setup_panic_handler();

    let env_options = SessionOptions::from_env().context("invalid environment configuration")?;
    let cli_options = SessionOptions::from_args(std::env::args().skip(1))
        .context("invalid command-line arguments")?;
    let options = env_options.merged_with(&cli_options);

    let session = Session::new(&options).context("failed to start editing session")?;
    let stdin = io::stdin();
    let mut stdout = BufWriter::new(io::stdout().lock());
    session
        .run(stdin.lock(), &mut stdout)
        .context("editing session aborted")?;
    Ok(())
}
