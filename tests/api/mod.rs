mod session_flow_tests;
mod wire_tests;
