mod test_window_invariants;
