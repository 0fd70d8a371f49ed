//! Wire formats of the hosted model APIs.

pub mod gemini;
