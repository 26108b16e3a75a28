//! # httpit-core
//!
//! httpit 설정, 요청 템플릿 빌더, 결과 모델, 포트(trait), 에러 타입.
//! 다른 모든 crate가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`config`]: 벤치마크 설정 구조체 + 정규화
//! - [`profile`]: 프로파일 파일/환경변수 로드 (`config` crate)
//! - [`header`]: `key:value` 헤더 파싱, Set/Add 의미
//! - [`args`]: `key=value` / `key:=value` 본문 인코딩
//! - [`template`]: 요청 템플릿 조립
//! - [`models`]: 요청 결과, 처리량 카운터, 집계 스냅샷
//! - [`ports`]: 요청 발행 포트 (async_trait)
//! - [`error`]: 핵심 에러 타입 (thiserror)

pub mod args;
pub mod config;
pub mod error;
pub mod header;
pub mod models;
pub mod ports;
pub mod profile;
pub mod template;
