// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::expect::ExpectError;

use super::CollectError;

#[test]
fn expect_errors_map_to_collect_kinds() {
    let closed: CollectError = ExpectError::Closed.into();
    assert!(matches!(closed, CollectError::ConnectionClosed));

    let timeout: CollectError = ExpectError::Timeout { partial: "half".to_owned() }.into();
    assert!(matches!(timeout, CollectError::Timeout));
}

#[test]
fn at_step_names_the_command() {
    let e = CollectError::at_step("terminal length 0", ExpectError::Closed);
    assert_eq!(e.to_string(), "'terminal length 0' failed: connection closed");

    let e = CollectError::at_step(
        "show running-config",
        ExpectError::Timeout { partial: String::new() },
    );
    assert_eq!(e.to_string(), "'show running-config' failed: timed out");
}

#[test]
fn auth_failed_displays_bare_message() {
    let e = CollectError::AuthFailed("Bad username or password".to_owned());
    assert_eq!(e.to_string(), "Bad username or password");
}

#[test]
fn connection_open_failed_names_target() {
    let e = CollectError::ConnectionOpenFailed {
        target: "10.0.0.1".to_owned(),
        detail: "forkpty failed".to_owned(),
    };
    assert!(e.to_string().contains("10.0.0.1"));
}
