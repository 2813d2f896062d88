use rir::lens::delegation::{CountryQueryArgs, DelegationLens};

use super::{fail, print_line, print_stream};

pub async fn run(lens: &DelegationLens, args: CountryQueryArgs) {
    if let Err(e) = args.validate() {
        fail(e);
    }

    if args.hosts {
        match lens.host_counts(&args).await {
            Ok(counts) => print_line(&mut std::io::stdout(), counts),
            Err(e) => fail(e),
        }
        return;
    }

    match lens.country_prefixes(&args) {
        Ok(prefixes) => print_stream(prefixes).await,
        Err(e) => fail(e),
    }
}
