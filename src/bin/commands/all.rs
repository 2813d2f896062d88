use futures::StreamExt;
use rir::lens::delegation::DelegationLens;

use super::print_stream;

pub async fn run(lens: &DelegationLens, limit: Option<usize>) {
    let records = lens.all_records();
    match limit {
        Some(n) => print_stream(records.take(n).boxed()).await,
        None => print_stream(records).await,
    }
}
