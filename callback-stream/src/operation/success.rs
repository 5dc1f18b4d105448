/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

use crate::error::BridgeError;

/// Marker item for an operation that completed without producing a value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Success;

/// Maps a void completion onto one [`Success`] item. Failures pass through.
pub fn void_to_success(
    result: Result<Option<()>, BridgeError>,
) -> Result<Option<Success>, BridgeError> {
    result.map(|_| Some(Success))
}
