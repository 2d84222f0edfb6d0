use relvault_lib::cli::{parse_args, resolve_command, run_backup, run_check, run_status, ResolvedCommand};
use relvault_lib::error::RelvaultError;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), RelvaultError> {
    color_eyre::install()?;

    let args = parse_args();
    let command = resolve_command(args.command)?;

    match command {
        ResolvedCommand::Run(params) => run_backup(params).await?,
        ResolvedCommand::Check(params) => run_check(params).await?,
        ResolvedCommand::Status(params) => run_status(params)?,
    }

    Ok(())
}
