use rir::lens::delegation::{DelegationLens, IpLookupArgs};

use super::{fail, print_stream};

pub async fn run(lens: &DelegationLens, args: IpLookupArgs) {
    match lens.lookup_ip(&args) {
        Ok(matches) => print_stream(matches).await,
        Err(e) => fail(e),
    }
}
