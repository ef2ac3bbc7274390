//! expiry-core
//!
//! Core building blocks for the content expiration sweeper.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, item, status, expiration, query, errors）
//! - **ports**: 抽象化レイヤー（ContentStore, Scheduler, Clock, NonceVerifier, IdGenerator）
//! - **app**: アプリケーションロジック（builder, sweeper, setup, dispatch, editor）
//! - **impls**: 実装（InMemoryContentStore など開発用）
//! - **config**: 環境変数からの設定読み込み

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
