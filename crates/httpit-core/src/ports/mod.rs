//! 포트 인터페이스 (trait).
//!
//! 코디네이터는 `Arc<dyn Requester>`만 알고, 실제 연결 전략은
//! `httpit-network` crate가 구현한다. 테스트는 스텁 구현을 주입한다.

pub mod requester;
