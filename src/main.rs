// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

use clap::CommandFactory;
use rabbitmq_sender::{
    channel::LapinConnector,
    cli::{self, SenderArgs},
    delivery::MessageSender,
    logging,
    report::Outcome,
};
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    logging::init();

    let outcome = match cli::parse_args() {
        Ok(args) => {
            MessageSender::new(LapinConnector::default())
                .send(args.into())
                .await
        }
        Err(err) => Outcome::from(err),
    };

    if let Outcome::Invalid(_) = outcome {
        eprintln!("{}", SenderArgs::command().render_usage());
    }
    println!("{outcome}");

    ExitCode::from(outcome.exit_code())
}
