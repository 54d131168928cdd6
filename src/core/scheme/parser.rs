use super::LevelScheme;
use crate::core::errors::SchemeError;
use log::{error, info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const LEVEL_KEYWORD: &str = "level";
const TRANSITION_KEYWORD: &str = "transition";

/// Counts gathered while loading a level scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Levels added
    pub levels: usize,
    /// Transitions added
    pub transitions: usize,
    /// Lines without a recognised keyword (comments, blanks, other text)
    pub ignored_lines: usize,
    /// Lines with a keyword whose three values could not be read
    pub malformed_lines: usize,
    /// Transitions dropped because an endpoint had no level within tolerance
    pub unresolved_transitions: usize,
}

impl LoadReport {
    /// Whether anything the scheme described was discarded
    pub fn has_drops(&self) -> bool {
        self.malformed_lines > 0 || self.unresolved_transitions > 0
    }
}

enum Record {
    Level { energy: f64, tau: f64, population: f64 },
    Transition { from: f64, to: f64, intensity: f64 },
    Malformed,
    Other,
}

/// Read the three values following a keyword. Extra tokens are ignored.
fn read_triple(rest: &str) -> Option<(f64, f64, f64)> {
    let mut values = rest.split_whitespace().map(|tok| tok.parse::<f64>());
    match (values.next(), values.next(), values.next()) {
        (Some(Ok(a)), Some(Ok(b)), Some(Ok(c))) => Some((a, b, c)),
        _ => None,
    }
}

/// Values following `keyword`, if the line is a record of that kind.
///
/// The keyword must be followed by whitespace or the start of a number, so
/// prose such as `levels of 152Eu` is not taken for a record.
fn record_values<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    match rest.chars().next() {
        Some(c) if c.is_whitespace() || c.is_ascii_digit() || matches!(c, '+' | '-' | '.') => {
            Some(rest)
        }
        _ => None,
    }
}

fn classify(line: &str) -> Record {
    if let Some(rest) = record_values(line, TRANSITION_KEYWORD) {
        return match read_triple(rest) {
            Some((from, to, intensity)) => Record::Transition {
                from,
                to,
                intensity,
            },
            None => Record::Malformed,
        };
    }
    if let Some(rest) = record_values(line, LEVEL_KEYWORD) {
        return match read_triple(rest) {
            Some((energy, tau, population)) => Record::Level {
                energy,
                tau,
                population,
            },
            None => Record::Malformed,
        };
    }
    Record::Other
}

impl LevelScheme {
    /// Parse a level scheme from any buffered reader.
    ///
    /// Lines of the form `level <energy> <tau> <population>` add a level and
    /// `transition <E1> <E2> <intensity>` adds a transition between the
    /// levels nearest `E1` and `E2`. Everything else is ignored. In
    /// permissive mode malformed lines and unresolved transitions are
    /// counted and dropped; with `strict` they are returned as errors.
    pub fn load<R: BufRead>(mut reader: R, strict: bool) -> Result<(Self, LoadReport), SchemeError> {
        let mut scheme = LevelScheme::new();
        let mut report = LoadReport::default();
        let mut bytes = Vec::new();
        let mut line_no = 0;

        loop {
            bytes.clear();
            if reader.read_until(b'\n', &mut bytes)? == 0 {
                break;
            }
            line_no += 1;
            // Data files often carry Latin-1 comments; undecodable bytes
            // must not abort the load
            let decoded = String::from_utf8_lossy(&bytes);
            let line = decoded.trim_end_matches(&['\r', '\n'][..]);
            match classify(line) {
                Record::Level {
                    energy,
                    tau,
                    population,
                } => {
                    scheme.add_level(energy, tau, population);
                    report.levels += 1;
                }
                Record::Transition {
                    from,
                    to,
                    intensity,
                } => match scheme.add_transition(from, to, intensity) {
                    Some(_) => report.transitions += 1,
                    None => {
                        if strict {
                            let energy = if scheme.nearest_level(from).is_none() {
                                from
                            } else {
                                to
                            };
                            return Err(SchemeError::UnresolvedTransition {
                                line: line_no,
                                energy,
                                tolerance: super::NEAREST_LEVEL_TOLERANCE,
                            });
                        }
                        warn!(
                            "Dropping transition {} -> {} keV on line {}: no matching level",
                            from, to, line_no
                        );
                        report.unresolved_transitions += 1;
                    }
                },
                Record::Malformed => {
                    if strict {
                        return Err(SchemeError::MalformedLine {
                            line: line_no,
                            text: line.to_string(),
                        });
                    }
                    warn!("Skipping malformed line {}: {:?}", line_no, line);
                    report.malformed_lines += 1;
                }
                Record::Other => report.ignored_lines += 1,
            }
        }

        Ok((scheme, report))
    }

    /// Parse a level scheme held in a string
    pub fn parse_str(text: &str, strict: bool) -> Result<(Self, LoadReport), SchemeError> {
        Self::load(text.as_bytes(), strict)
    }

    /// Load a level scheme file. Failing to open it is an error.
    pub fn load_path<P: AsRef<Path>>(
        path: P,
        strict: bool,
    ) -> Result<(Self, LoadReport), SchemeError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SchemeError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let (scheme, report) = Self::load(BufReader::new(file), strict)?;
        info!(
            "Loaded level scheme {}: {} levels, {} transitions",
            path.display(),
            report.levels,
            report.transitions
        );
        if report.has_drops() {
            warn!(
                "Level scheme {}: {} malformed lines and {} unresolved transitions dropped",
                path.display(),
                report.malformed_lines,
                report.unresolved_transitions
            );
        }
        Ok((scheme, report))
    }

    /// Load a level scheme file, falling back to an empty scheme when the
    /// file cannot be opened. An empty scheme yields no gammas.
    pub fn load_path_or_empty<P: AsRef<Path>>(path: P) -> Result<(Self, LoadReport), SchemeError> {
        match Self::load_path(path, false) {
            Err(err @ SchemeError::Open { .. }) => {
                error!("{}; continuing with an empty level scheme", err);
                Ok((LevelScheme::new(), LoadReport::default()))
            }
            other => other,
        }
    }
}
