//! End-to-end scenarios S1-S6 from spec §8, driven the way the binary
//! drives `System`: each line goes through `framing::parse_line` and
//! then `System::dispatch`, and assertions are made on the structured
//! `Response`, not on rendered text (text rendering is the driver's
//! job, per the Non-goals).

use railbook::command::{BuyOutcome, Response};
use railbook::config::StorageConfig;
use railbook::framing::parse_line;
use railbook::system::System;

fn open_system() -> (System, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = StorageConfig::new(dir.path());
    (System::open(&config).unwrap(), dir)
}

fn run(system: &mut System, line: &str) -> Response {
    let framed = parse_line(line).expect("non-blank line");
    match framed.command {
        Ok(command) => system.dispatch(command),
        Err(_) => Response::Failure,
    }
}

fn is_ack(r: &Response) -> bool {
    matches!(r, Response::Ack)
}

fn is_failure(r: &Response) -> bool {
    matches!(r, Response::Failure)
}

#[test]
fn s1_first_user_bootstrap_forces_privilege_ten() {
    let (mut system, _dir) = open_system();

    assert!(is_ack(&run(
        &mut system,
        "[1] add_user -c x -u alice -p pw -n A -m a@x -g 5"
    )));
    assert!(is_ack(&run(&mut system, "[2] login -u alice -p pw")));

    match run(&mut system, "[3] query_profile -c alice -u alice") {
        Response::Profile(profile) => {
            assert_eq!(profile.uid.as_str(), "alice");
            assert_eq!(profile.name.as_str(), "A");
            assert_eq!(profile.mail.as_str(), "a@x");
            assert_eq!(profile.privilege, 10);
        }
        other => panic!("expected a profile, got {other:?}"),
    }
}

#[test]
fn s2_released_train_answers_a_direct_ticket_search() {
    let (mut system, _dir) = open_system();
    run(&mut system, "[1] add_user -c x -u alice -p pw -n A -m a@x -g 5");

    assert!(is_ack(&run(
        &mut system,
        "[2] add_train -i T1 -n 3 -m 100 -s A|B|C -p 5|10 -x 08:00 -t 60|60 -o 30 -d 06-01|06-30 -y G"
    )));
    assert!(is_ack(&run(&mut system, "[3] release_train -i T1")));

    match run(&mut system, "[4] query_ticket -s A -t C -d 06-01") {
        Response::Tickets(legs) => {
            assert_eq!(legs.len(), 1);
            let leg = &legs[0];
            assert_eq!(leg.train_id.as_str(), "T1");
            assert_eq!((leg.arriving - leg.leaving).raw(), 150);
            assert_eq!(leg.cost, 15);
            assert_eq!(leg.seats, 100);
        }
        other => panic!("expected tickets, got {other:?}"),
    }
}

#[test]
fn s3_wait_queue_is_drained_fifo_on_refund() {
    let (mut system, _dir) = open_system();
    run(&mut system, "[1] add_user -c x -u alice -p pw -n A -m a@x -g 5");
    run(&mut system, "[2] login -u alice -p pw");
    run(
        &mut system,
        "[3] add_train -i T1 -n 3 -m 2 -s A|B|C -p 5|10 -x 08:00 -t 60|60 -o 30 -d 06-01|06-30 -y G",
    );
    run(&mut system, "[4] release_train -i T1");

    let first = run(
        &mut system,
        "[5] buy_ticket -u alice -i T1 -d 06-01 -n 1 -f A -t C",
    );
    assert!(matches!(first, Response::Bought(BuyOutcome::Purchased { .. })));
    let second = run(
        &mut system,
        "[6] buy_ticket -u alice -i T1 -d 06-01 -n 1 -f A -t C",
    );
    assert!(matches!(second, Response::Bought(BuyOutcome::Purchased { .. })));

    assert!(is_failure(&run(
        &mut system,
        "[7] buy_ticket -u alice -i T1 -d 06-01 -n 1 -f A -t C -q false",
    )));
    let queued = run(
        &mut system,
        "[8] buy_ticket -u alice -i T1 -d 06-01 -n 1 -f A -t C -q true",
    );
    assert!(matches!(queued, Response::Bought(BuyOutcome::Queued)));

    assert!(is_ack(&run(&mut system, "[9] refund_ticket -u alice -n 3")));

    match run(&mut system, "[10] query_order -u alice") {
        Response::Orders(orders) => {
            assert_eq!(orders.len(), 3);
            let promoted = orders
                .iter()
                .find(|o| o.status_label == "success" && o.train_id.as_str() == "T1")
                .expect("one success order besides the refunded one");
            let _ = promoted;
            assert_eq!(orders.iter().filter(|o| o.status_label == "pending").count(), 0);
            assert_eq!(orders.iter().filter(|o| o.status_label == "refunded").count(), 1);
        }
        other => panic!("expected orders, got {other:?}"),
    }
}

#[test]
fn s4_transfer_search_prefers_cheaper_itinerary() {
    let (mut system, _dir) = open_system();
    run(&mut system, "[1] add_user -c x -u alice -p pw -n A -m a@x -g 5");
    run(
        &mut system,
        "[2] add_train -i T1 -n 2 -m 100 -s A|M -p 20 -x 08:00 -t 60 -o 0 -d 06-01|06-30 -y G",
    );
    run(&mut system, "[3] release_train -i T1");
    run(
        &mut system,
        "[4] add_train -i T2 -n 2 -m 100 -s M|Z -p 5 -x 10:00 -t 60 -o 0 -d 06-01|06-30 -y G",
    );
    run(&mut system, "[5] release_train -i T2");

    match run(&mut system, "[6] query_transfer -s A -t Z -d 06-01 -p cost") {
        Response::Transfer(Some((leg1, leg2))) => {
            assert_eq!(leg1.train_id.as_str(), "T1");
            assert_eq!(leg2.train_id.as_str(), "T2");
            assert_eq!(leg1.cost + leg2.cost, 25);
        }
        other => panic!("expected a transfer itinerary, got {other:?}"),
    }
}

#[test]
fn s5_unreleased_train_can_be_deleted_released_cannot() {
    let (mut system, _dir) = open_system();
    run(&mut system, "[1] add_user -c x -u alice -p pw -n A -m a@x -g 5");
    run(
        &mut system,
        "[2] add_train -i T1 -n 3 -m 100 -s A|B|C -p 5|10 -x 08:00 -t 60|60 -o 30 -d 06-01|06-30 -y G",
    );

    assert!(is_ack(&run(&mut system, "[3] delete_train -i T1")));

    run(
        &mut system,
        "[4] add_train -i T1 -n 3 -m 100 -s A|B|C -p 5|10 -x 08:00 -t 60|60 -o 30 -d 06-01|06-30 -y G",
    );
    run(&mut system, "[5] release_train -i T1");
    assert!(is_failure(&run(&mut system, "[6] delete_train -i T1")));
}

#[test]
fn s6_clean_drops_every_logged_in_session() {
    let (mut system, _dir) = open_system();
    run(&mut system, "[1] add_user -c x -u alice -p pw -n A -m a@x -g 5");
    run(&mut system, "[2] login -u alice -p pw");

    assert!(is_ack(&run(&mut system, "[3] clean")));
    assert!(is_failure(&run(&mut system, "[4] login -u alice -p pw")));
}
