// Application layer: runs engine queries and renders the results.

pub mod report;
