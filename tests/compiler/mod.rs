mod tests_compile;
