use anyhow::Result;
use clap::CommandFactory;
use clap_complete::Shell;

pub fn run_completions<C: CommandFactory>(shell: Shell) -> Result<()> {
    clap_complete::generate(shell, &mut C::command(), "brewlet", &mut std::io::stdout());
    Ok(())
}
