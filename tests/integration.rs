//! Integration tests for the weighstation host-testable logic.

use weighstation::serial::weight;
use weighstation::workflow::{menu_event, transition};
use weighstation::{
    Event, HttpReply, InputMethod, Key, PieceType, ScanRequest, State, SubmissionOutcome,
    TransportError, WeightReading,
};

fn request(piece_id: &str, frame: &[u8]) -> ScanRequest {
    ScanRequest {
        piece_id: piece_id.into(),
        weight: weight::parse(frame),
        piece_type: PieceType::Cutting,
        tech_id: "123".into(),
        machine_id: "1".into(),
    }
}

#[test]
fn scale_frame_to_request_url() {
    let url = request("AB12", b"ST,GS,+ 12.50kg\r").url("http://host/api/Scan");
    assert_eq!(
        url,
        "http://host/api/Scan?pieceId=AB12&weight=12.50&TechId=123&status=2&MachId=1"
    );
}

#[test]
fn barcode_text_is_escaped_in_the_url() {
    let url = request("A 1&2", b"ST,GS,1.00").url("http://h/s");
    assert!(url.starts_with("http://h/s?pieceId=A%201%262&"), "{url}");
}

#[test]
fn short_scale_frame_submits_fallback() {
    assert_eq!(weight::parse(b"garbage"), WeightReading::new("0.00"));
}

#[test]
fn menus_drive_a_full_keypad_cycle() {
    let mut state = State::SelectType;
    for key in [Key::Num1, Key::Num1] {
        let event = menu_event(&state, key).expect("menu key");
        state = transition(state, event);
    }
    assert_eq!(
        state,
        State::EnterId {
            piece_type: PieceType::Out,
            method: InputMethod::Keypad
        }
    );

    state = transition(state, Event::IdCaptured("7".into()));
    state = transition(state, Event::WeightCaptured(WeightReading::new("3.10")));
    assert!(matches!(state, State::Submit { ref piece_id, .. } if piece_id == "7"));

    // After submitting, the station waits for the next id with the same selections.
    state = transition(state, Event::Submitted);
    assert_eq!(
        state,
        State::EnterId {
            piece_type: PieceType::Out,
            method: InputMethod::Keypad
        }
    );
}

#[test]
fn back_walks_up_to_the_type_menu() {
    let mut state = State::EnterId {
        piece_type: PieceType::Cutting,
        method: InputMethod::Barcode,
    };
    state = transition(state, Event::Back);
    assert_eq!(
        state,
        State::SelectInputMethod {
            piece_type: PieceType::Cutting
        }
    );
    state = transition(state, Event::Back);
    assert_eq!(state, State::SelectType);
}

#[test]
fn maintenance_is_only_reachable_from_the_type_menu() {
    assert_eq!(
        menu_event(&State::SelectType, Key::Star),
        Some(Event::MaintenanceRequested)
    );
    let method_menu = State::SelectInputMethod {
        piece_type: PieceType::Out,
    };
    assert_eq!(menu_event(&method_menu, Key::Star), None);
}

#[test]
fn server_replies_map_to_outcomes() {
    let ok = HttpReply {
        status: 200,
        body: br#"{"pieceWeight_InZ": "9.75", "extra": true}"#.to_vec(),
    };
    assert_eq!(
        SubmissionOutcome::from_reply(&ok),
        SubmissionOutcome::Success {
            incoming_weight: "9.75".into()
        }
    );

    let rejected = HttpReply {
        status: 409,
        body: br#"{"statusCode": "DUP", "message": "Piece already scanned"}"#.to_vec(),
    };
    assert_eq!(
        SubmissionOutcome::from_reply(&rejected),
        SubmissionOutcome::KnownError {
            code: "DUP".into(),
            message: "Piece already scanned".into()
        }
    );

    let html = HttpReply {
        status: 502,
        body: b"<html>Bad Gateway</html>".to_vec(),
    };
    assert_eq!(
        SubmissionOutcome::from_reply(&html),
        SubmissionOutcome::UnknownError { status_code: 502 }
    );
}

#[test]
fn transport_failure_detail_is_shortened() {
    let result = Err(TransportError::new("ConnectionAborted while reading"));
    assert_eq!(
        SubmissionOutcome::from_result(&result),
        SubmissionOutcome::TransportFailure {
            detail: "ConnectionAb".into()
        }
    );
}
