//! Line-level command framing (spec §1, §6): the "external collaborator"
//! that the core itself does not specify. Each input line is either
//! blank, or a timestamp token followed by a command name and zero or
//! more `-x value` pairs. This module turns that text into a typed
//! [`Command`], enforcing the per-command letter sets of spec §6 before
//! the core ever sees it.

use std::collections::HashMap;

use bitflags::bitflags;

use crate::command::{Command, SortKey};
use crate::error::CoreError;
use crate::ids::{DisplayName, MailAddr, Password, StationName, TrainId, UserId};
use crate::time::Minutes;

bitflags! {
    /// Which option letters a command line actually supplied. Used to
    /// validate the variable-arity commands (`modify_profile`'s subset
    /// of `p,n,m,g`; the optional `q`/`p`/`n` of `buy_ticket` /
    /// `query_ticket` / `query_transfer` / `refund_ticket`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OptionLetters: u32 {
        const P = 1 << 0;
        const N = 1 << 1;
        const M = 1 << 2;
        const G = 1 << 3;
        const Q = 1 << 4;
    }
}

/// The outcome of framing one non-blank line: the timestamp token to
/// echo back, and either a parsed command or the argument error that
/// should become the wire-level `-1`.
pub struct Framed {
    pub timestamp: String,
    pub command: Result<Command, CoreError>,
}

/// Parse one input line. Returns `None` for a blank line, which the
/// driver should simply skip (spec §6: "empty (emit nothing, continue)").
pub fn parse_line(line: &str) -> Option<Framed> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }

    let mut tokens = line.split_whitespace();
    let timestamp = tokens.next()?.to_string();
    let Some(name) = tokens.next() else {
        return Some(Framed {
            timestamp,
            command: Err(CoreError::Arg("missing command name")),
        });
    };

    let mut args: HashMap<char, String> = HashMap::new();
    let mut letters_seen = OptionLetters::empty();
    let rest: Vec<&str> = tokens.collect();
    let mut i = 0;
    while i < rest.len() {
        let Some(letter) = rest[i].strip_prefix('-').and_then(|s| s.chars().next()) else {
            return Some(Framed {
                timestamp,
                command: Err(CoreError::Arg("expected '-x' option letter")),
            });
        };
        let Some(value) = rest.get(i + 1) else {
            return Some(Framed {
                timestamp,
                command: Err(CoreError::Arg("option letter missing a value")),
            });
        };
        args.insert(letter, value.to_string());
        if let Some(bit) = letter_bit(letter) {
            letters_seen |= bit;
        }
        i += 2;
    }

    let command = build_command(name, &args, letters_seen);
    Some(Framed { timestamp, command })
}

fn letter_bit(letter: char) -> Option<OptionLetters> {
    match letter {
        'p' => Some(OptionLetters::P),
        'n' => Some(OptionLetters::N),
        'm' => Some(OptionLetters::M),
        'g' => Some(OptionLetters::G),
        'q' => Some(OptionLetters::Q),
        _ => None,
    }
}

fn build_command(
    name: &str,
    args: &HashMap<char, String>,
    letters_seen: OptionLetters,
) -> Result<Command, CoreError> {
    match name {
        "add_user" => {
            require_count(args, 6)?;
            Ok(Command::AddUser {
                cur_uid: args.get(&'c').map(|s| UserId::try_from(s.as_str())).transpose()?,
                new_uid: uid(args, 'u')?,
                password: password(args, 'p')?,
                name: display_name(args, 'n')?,
                mail: mail(args, 'm')?,
                privilege: privilege(args, 'g')?,
            })
        }
        "login" => {
            require_count(args, 2)?;
            Ok(Command::Login {
                uid: uid(args, 'u')?,
                password: password(args, 'p')?,
            })
        }
        "logout" => {
            require_count(args, 1)?;
            Ok(Command::Logout { uid: uid(args, 'u')? })
        }
        "query_profile" => {
            require_count(args, 2)?;
            Ok(Command::QueryProfile {
                cur_uid: uid(args, 'c')?,
                uid: uid(args, 'u')?,
            })
        }
        "modify_profile" => {
            if args.len() < 2 || args.len() > 6 || !args.contains_key(&'c') || !args.contains_key(&'u') {
                return Err(CoreError::Arg("modify_profile expects 2..6 letters including c and u"));
            }
            Ok(Command::ModifyProfile {
                cur_uid: uid(args, 'c')?,
                uid: uid(args, 'u')?,
                password: opt(letters_seen, OptionLetters::P, args, 'p', password)?,
                name: opt(letters_seen, OptionLetters::N, args, 'n', display_name)?,
                mail: opt(letters_seen, OptionLetters::M, args, 'm', mail)?,
                privilege: if letters_seen.contains(OptionLetters::G) {
                    Some(privilege(args, 'g')?)
                } else {
                    None
                },
            })
        }
        "add_train" => {
            require_count(args, 10)?;
            let stations: Vec<StationName> = pipe_list(args, 's')?
                .into_iter()
                .map(StationName::try_from)
                .collect::<Result<_, _>>()?;
            let per_link_prices = pipe_int_list(args, 'p')?;
            let travel_times = pipe_int_list(args, 't')?;
            // Present unconditionally (add_train always supplies all ten
            // letters); unused when there are no intermediate stops.
            let stopover_times = pipe_int_list(args, 'o')?;
            let station_num = stations.len();
            let per_link_count = station_num.saturating_sub(1);
            let stopover_count = station_num.saturating_sub(2);
            if per_link_prices.len() != per_link_count
                || travel_times.len() != per_link_count
                || stopover_times.len() != stopover_count
            {
                return Err(CoreError::Arg("pipe-delimited list length mismatch"));
            }
            let (start_sale_date, end_sale_date) = pipe_date_pair(args, 'd')?;
            Ok(Command::AddTrain {
                id: train_id(args, 'i')?,
                stations,
                prices: per_link_prices,
                start_time: Minutes::parse_date_time(&format!("01-01 {}", value(args, 'x')?))?,
                travel_times,
                stopover_times,
                total_seat_num: int(args, 'm')?,
                start_sale_date,
                end_sale_date,
                train_type: char_value(args, 'y')?,
            })
        }
        "release_train" => {
            require_count(args, 1)?;
            Ok(Command::ReleaseTrain { id: train_id(args, 'i')? })
        }
        "query_train" => {
            require_count(args, 2)?;
            Ok(Command::QueryTrain {
                id: train_id(args, 'i')?,
                date: Minutes::parse_date(value(args, 'd')?)?,
            })
        }
        "delete_train" => {
            require_count(args, 1)?;
            Ok(Command::DeleteTrain { id: train_id(args, 'i')? })
        }
        "query_ticket" => {
            require_count_range(args, 3, 4)?;
            Ok(Command::QueryTicket {
                s: station(args, 's')?,
                t: station(args, 't')?,
                date: Minutes::parse_date(value(args, 'd')?)?,
                sort_key: sort_key(args)?,
            })
        }
        "query_transfer" => {
            require_count_range(args, 3, 4)?;
            Ok(Command::QueryTransfer {
                s: station(args, 's')?,
                t: station(args, 't')?,
                date: Minutes::parse_date(value(args, 'd')?)?,
                sort_key: sort_key(args)?,
            })
        }
        "buy_ticket" => {
            require_count_range(args, 6, 7)?;
            Ok(Command::BuyTicket {
                uid: uid(args, 'u')?,
                id: train_id(args, 'i')?,
                date: Minutes::parse_date(value(args, 'd')?)?,
                num: int(args, 'n')?,
                from: station(args, 'f')?,
                to: station(args, 't')?,
                accept_queue: if letters_seen.contains(OptionLetters::Q) {
                    match value(args, 'q')?.as_str() {
                        "true" => true,
                        "false" => false,
                        _ => return Err(CoreError::Arg("-q must be 'true' or 'false'")),
                    }
                } else {
                    false
                },
            })
        }
        "query_order" => {
            require_count(args, 1)?;
            Ok(Command::QueryOrder { uid: uid(args, 'u')? })
        }
        "refund_ticket" => {
            if args.is_empty() || args.len() > 2 || !args.contains_key(&'u') {
                return Err(CoreError::Arg("refund_ticket expects -u and optional -n"));
            }
            Ok(Command::RefundTicket {
                uid: uid(args, 'u')?,
                n: if letters_seen.contains(OptionLetters::N) {
                    int(args, 'n')?.try_into().map_err(|_| CoreError::Arg("-n out of range"))?
                } else {
                    1
                },
            })
        }
        "clean" => {
            require_count(args, 0)?;
            Ok(Command::Clean)
        }
        "exit" => {
            require_count(args, 0)?;
            Ok(Command::Exit)
        }
        _ => Err(CoreError::Arg("unrecognised command")),
    }
}

fn require_count(args: &HashMap<char, String>, n: usize) -> Result<(), CoreError> {
    if args.len() != n {
        return Err(CoreError::Arg("wrong option count"));
    }
    Ok(())
}

fn require_count_range(args: &HashMap<char, String>, lo: usize, hi: usize) -> Result<(), CoreError> {
    if args.len() < lo || args.len() > hi {
        return Err(CoreError::Arg("wrong option count"));
    }
    Ok(())
}

fn value<'a>(args: &'a HashMap<char, String>, letter: char) -> Result<&'a String, CoreError> {
    args.get(&letter).ok_or(CoreError::Arg("missing required option"))
}

fn uid(args: &HashMap<char, String>, letter: char) -> Result<UserId, CoreError> {
    UserId::try_from(value(args, letter)?.as_str())
}

fn train_id(args: &HashMap<char, String>, letter: char) -> Result<TrainId, CoreError> {
    TrainId::try_from(value(args, letter)?.as_str())
}

fn station(args: &HashMap<char, String>, letter: char) -> Result<StationName, CoreError> {
    StationName::try_from(value(args, letter)?.as_str())
}

fn password(args: &HashMap<char, String>, letter: char) -> Result<Password, CoreError> {
    Password::try_from(value(args, letter)?.as_str())
}

fn display_name(args: &HashMap<char, String>, letter: char) -> Result<DisplayName, CoreError> {
    DisplayName::try_from(value(args, letter)?.as_str())
}

fn mail(args: &HashMap<char, String>, letter: char) -> Result<MailAddr, CoreError> {
    MailAddr::try_from(value(args, letter)?.as_str())
}

fn privilege(args: &HashMap<char, String>, letter: char) -> Result<u8, CoreError> {
    let p: u8 = value(args, letter)?.parse().map_err(|_| CoreError::Arg("bad privilege"))?;
    if p > 10 {
        return Err(CoreError::Arg("privilege out of range"));
    }
    Ok(p)
}

fn int(args: &HashMap<char, String>, letter: char) -> Result<i64, CoreError> {
    value(args, letter)?.parse().map_err(|_| CoreError::Arg("expected an integer"))
}

fn char_value(args: &HashMap<char, String>, letter: char) -> Result<char, CoreError> {
    value(args, letter)?.chars().next().ok_or(CoreError::Arg("expected a character"))
}

fn pipe_list(args: &HashMap<char, String>, letter: char) -> Result<Vec<String>, CoreError> {
    Ok(value(args, letter)?.split('|').map(str::to_string).collect())
}

fn pipe_int_list(args: &HashMap<char, String>, letter: char) -> Result<Vec<i64>, CoreError> {
    value(args, letter)?
        .split('|')
        .map(|s| s.parse().map_err(|_| CoreError::Arg("expected an integer in a pipe list")))
        .collect()
}

fn pipe_date_pair(args: &HashMap<char, String>, letter: char) -> Result<(Minutes, Minutes), CoreError> {
    let raw = value(args, letter)?;
    let (start, end) = raw.split_once('|').ok_or(CoreError::Arg("expected 'MM-DD|MM-DD'"))?;
    Ok((Minutes::parse_date(start)?, Minutes::parse_date(end)?))
}

fn sort_key(args: &HashMap<char, String>) -> Result<SortKey, CoreError> {
    match args.get(&'p').map(String::as_str) {
        None | Some("time") => Ok(SortKey::Time),
        Some("cost") => Ok(SortKey::Cost),
        Some(_) => Err(CoreError::Arg("-p must be 'time' or 'cost'")),
    }
}

fn opt<T>(
    seen: OptionLetters,
    bit: OptionLetters,
    args: &HashMap<char, String>,
    letter: char,
    parse: impl Fn(&HashMap<char, String>, char) -> Result<T, CoreError>,
) -> Result<Option<T>, CoreError> {
    if seen.contains(bit) {
        Ok(Some(parse(args, letter)?))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_line_yields_none() {
        assert!(parse_line("").is_none());
        assert!(parse_line("   \n").is_none());
    }

    #[test]
    fn parses_login() {
        let framed = parse_line("[1] login -u alice -p pw").unwrap();
        assert_eq!(framed.timestamp, "[1]");
        match framed.command.unwrap() {
            Command::Login { uid, password } => {
                assert_eq!(uid.as_str(), "alice");
                assert_eq!(password.as_str(), "pw");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_wrong_arg_count() {
        let framed = parse_line("[1] login -u alice").unwrap();
        assert!(framed.command.is_err());
    }

    #[test]
    fn modify_profile_accepts_bare_c_u() {
        let framed = parse_line("[1] modify_profile -c alice -u bob").unwrap();
        assert!(framed.command.is_ok());
    }

    #[test]
    fn parses_add_train_pipe_lists() {
        let framed = parse_line(
            "[1] add_train -i T1 -n 3 -m 100 -s A|B|C -p 5|10 -x 08:00 -t 60|60 -o 30 -d 06-01|06-30 -y G",
        )
        .unwrap();
        match framed.command.unwrap() {
            Command::AddTrain { stations, prices, .. } => {
                assert_eq!(stations.len(), 3);
                assert_eq!(prices, vec![5, 10]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_add_train_with_mismatched_pipe_list_lengths() {
        let framed = parse_line(
            "[1] add_train -i T1 -n 3 -m 100 -s A|B|C -p 5 -x 08:00 -t 60|60 -o 30 -d 06-01|06-30 -y G",
        )
        .unwrap();
        assert!(framed.command.is_err());
    }
}
