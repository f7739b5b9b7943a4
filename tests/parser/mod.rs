mod tests_concurrency;
mod tests_lexing;
mod tests_precedence;
mod tests_recovery;
mod tests_scenarios;
