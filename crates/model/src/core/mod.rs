pub mod identifiers;
