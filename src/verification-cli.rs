//! A simple CLI tool for verifying published election audit reports.
//! This uses the server's own verification implementation, and is by definition
//! compatible with the output of `GET /api/elections/<election_id>/audit`.

use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::BufReader;

use clap::{Arg, ArgAction, ArgMatches, Command};
use rocket::serde::json::serde_json;

use ballot_backend::model::api::election::{AuditReport, CandidateAudit, VerificationError};

const PROGRAM_NAME: &str = "verify-ballot";

const ABOUT_TEXT: &str = "Verify that an election's published tally matches its receipts.

EXIT CODES:
     0: Verification succeeded.
   255: Ran successfully, but verification failed.
 Other: Error.";

const REPORT_PATH: &str = "REPORT_PATH";

const REPORT_PATH_HELP: &str = "The path to a JSON audit report of a specific election,\n\
as returned by `GET /api/elections/<election_id>/audit`";

/// Construct the CLI configuration.
fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    clap::command!(PROGRAM_NAME).about(ABOUT_TEXT).arg(
        Arg::new(REPORT_PATH)
            .help(REPORT_PATH_HELP)
            .action(ArgAction::Set)
            .required(true),
    )
}

/// Errors that this program may produce.
#[derive(Debug, Eq, PartialEq)]
enum Error {
    /// IO error described by the inner message.
    IO(String),
    /// Failed to decode the JSON report.
    Format(String),
    /// Verification failed due to the contained reason.
    Verification(VerificationError),
}

/// Verified results for a particular candidate, ready for printing.
#[derive(Debug, Eq, PartialEq)]
struct FriendlyResults {
    pub candidate_name: String,
    pub tally: u64,
}

impl From<CandidateAudit> for FriendlyResults {
    fn from(audit: CandidateAudit) -> Self {
        Self {
            candidate_name: audit.candidate_name,
            tally: audit.tally,
        }
    }
}

impl Display for FriendlyResults {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} vote{}",
            self.candidate_name,
            self.tally,
            if self.tally != 1 { "s" } else { "" },
        )
    }
}

/// Run verification.
fn verify(path: &str) -> Result<Vec<FriendlyResults>, Error> {
    // Load the file.
    let file = BufReader::new(File::open(path).map_err(|e| Error::IO(e.to_string()))?);
    let report: AuditReport =
        serde_json::from_reader(file).map_err(|e| Error::Format(e.to_string()))?;

    // Run verification.
    let audits = report.verify().map_err(Error::Verification)?;

    // Order by tally, then name.
    let mut results_list: Vec<FriendlyResults> =
        audits.into_iter().map(FriendlyResults::from).collect();
    results_list.sort_unstable_by(|a, b| a.candidate_name.cmp(&b.candidate_name));
    results_list.sort_by(|a, b| b.tally.cmp(&a.tally));

    Ok(results_list)
}

/// Run verification, report the result, and return the exit code.
fn run(args: &ArgMatches) -> u8 {
    let path: &String = args.get_one(REPORT_PATH).unwrap(); // Required argument is guaranteed to be present.
    match verify(path) {
        Ok(friendly_results) => {
            println!("Verification succeeded.");
            for result in friendly_results {
                println!("{}", result);
            }
            0
        }
        Err(Error::IO(msg)) => {
            println!("IO error: {}", msg);
            1
        }
        Err(Error::Format(msg)) => {
            println!("Invalid JSON: {}", msg);
            1
        }
        Err(Error::Verification(err)) => {
            println!("Verification failed: {}.", err);
            255
        }
    }
}

fn main() {
    let args = cli().get_matches();
    let exit_code = run(&args);
    std::process::exit(exit_code.into())
}
