use clap::Args;
use rir::lens::delegation::DelegationLens;

use super::{fail, print_line};

/// Arguments for the Summary command
#[derive(Args)]
pub struct SummaryArgs {
    /// Output as JSON
    #[clap(long)]
    pub json: bool,
}

pub async fn run(lens: &DelegationLens, args: SummaryArgs) {
    let summaries = match lens.summaries().await {
        Ok(s) => s,
        Err(e) => fail(e),
    };

    let mut stdout = std::io::stdout();
    if args.json {
        match serde_json::to_string_pretty(&summaries) {
            Ok(json) => print_line(&mut stdout, json),
            Err(e) => fail(e),
        }
        return;
    }

    for (i, summary) in summaries.iter().enumerate() {
        if i > 0 {
            print_line(&mut stdout, "");
        }
        print_line(&mut stdout, summary);
    }
}
