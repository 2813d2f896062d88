pub mod all;
pub mod config;
pub mod country;
pub mod ip;
pub mod summary;

use futures::stream::BoxStream;
use futures::StreamExt;
use rir::RirError;
use std::fmt::Display;
use std::io::Write;

/// Print an error and terminate with a failure status
pub(crate) fn fail(e: impl Display) -> ! {
    eprintln!("ERROR: {}", e);
    std::process::exit(1);
}

/// Write one line to stdout. A closed pipe (e.g. `| head`) ends the program quietly.
pub(crate) fn print_line(stdout: &mut impl Write, line: impl Display) {
    if let Err(e) = writeln!(stdout, "{}", line) {
        if e.kind() != std::io::ErrorKind::BrokenPipe {
            fail(e);
        }
        std::process::exit(0);
    }
}

/// Print every item of a query stream, stopping at the first error
pub(crate) async fn print_stream<T: Display>(mut items: BoxStream<'static, Result<T, RirError>>) {
    let mut stdout = std::io::stdout();
    while let Some(item) = items.next().await {
        match item {
            Ok(item) => print_line(&mut stdout, item),
            Err(e) => fail(e),
        }
    }
}
