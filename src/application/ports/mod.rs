pub mod collection_ports;
