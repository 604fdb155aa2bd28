// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

//! Identity: password hashing, signed bearer tokens and the request gate.

pub mod gate;
pub mod password;
pub mod token;

pub use gate::{bearer_token, AuthUser, MaybeBearer};
pub use token::{Claims, TokenError, TokenService};
