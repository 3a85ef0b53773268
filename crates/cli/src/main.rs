use clap::Parser;
use console::style;
use nbmail_logger::init_logger;
use std::process;

mod cmd;

type StdError = Box<dyn std::error::Error>;

fn main() {
    let cmd = cmd::Cmd::parse();

    let _guard =
        init_logger(cmd.pretty, cmd.log_level, &cmd.log_dir).unwrap_or_else(|e| print_error(e.into()));

    let res = match cmd.command {
        cmd::Commands::Preview(args) => args.preview(),
        cmd::Commands::Convert(args) => args.convert(),
        cmd::Commands::Send(args) => args.send(),
    };

    res.unwrap_or_else(|e| print_error(e));
}

fn print_error(e: StdError) -> ! {
    eprintln!("{} {e}", style("error:").red().bright().bold());
    process::exit(1)
}
