//! Sponsorship protocol tests against in-process collaborators.
#![allow(missing_docs, unreachable_pub)]

mod environment;
