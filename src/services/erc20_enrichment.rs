use std::sync::Arc;

use crate::{
    client::ExplorerApi,
    config::EnrichmentFailurePolicy,
    crypto::Address,
    format::format_token,
    models::Erc20TokenRef,
    services::state::{cache_key, ExplorerEvent, StateHandle, TokenValue},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentReport {
    pub resolved: usize,
    pub failed: usize,
    /// Tokens never requested, after an abort or supersession.
    pub skipped: usize,
    pub superseded: bool,
}

/// Resolves ERC-20 balances one token at a time, in token-list order.
pub struct Erc20EnrichmentPipeline {
    api: Arc<dyn ExplorerApi>,
    state: StateHandle,
    policy: EnrichmentFailurePolicy,
}

impl Erc20EnrichmentPipeline {
    pub fn new(api: Arc<dyn ExplorerApi>, state: StateHandle, policy: EnrichmentFailurePolicy) -> Self {
        Self { api, state, policy }
    }

    pub async fn run(
        &self,
        generation: u64,
        owner: &Address,
        tokens: &[Erc20TokenRef],
    ) -> EnrichmentReport {
        let mut report = EnrichmentReport::default();

        for (index, token) in tokens.iter().enumerate() {
            if !self.state.is_current(generation).await {
                report.superseded = true;
                report.skipped = tokens.len() - index;
                break;
            }

            let key = cache_key(&token.contract_address);
            let outcome = self
                .api
                .erc20_token_asset(owner.as_str(), &token.contract_address)
                .await
                .and_then(|balance| format_token(&balance.value, token.decimals));

            match outcome {
                Ok(value) => {
                    let published = self
                        .state
                        .publish_if_current(generation, |state| {
                            state
                                .token_values
                                .insert(key.clone(), TokenValue::Ready(value.clone()));
                        })
                        .await;
                    if published.is_none() {
                        report.superseded = true;
                        report.skipped = tokens.len() - index - 1;
                        break;
                    }
                    tracing::debug!("{} balance for {}: {}", token.symbol, owner, value);
                    report.resolved += 1;
                    self.state.emit(ExplorerEvent::TokenValueResolved {
                        generation,
                        contract: token.contract_address.clone(),
                        value,
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        "erc20 balance failed owner={} token={} ({}) err={}",
                        owner,
                        token.contract_address,
                        token.symbol,
                        err
                    );
                    let published = self
                        .state
                        .publish_if_current(generation, |state| {
                            state
                                .token_values
                                .insert(key.clone(), TokenValue::Failed(err.to_string()));
                        })
                        .await;
                    if published.is_none() {
                        report.superseded = true;
                        report.skipped = tokens.len() - index - 1;
                        break;
                    }
                    report.failed += 1;
                    self.state.emit(ExplorerEvent::TokenValueFailed {
                        generation,
                        contract: token.contract_address.clone(),
                        message: err.to_string(),
                    });
                    self.state.emit(ExplorerEvent::Error {
                        message: err.user_message(),
                    });

                    if self.policy == EnrichmentFailurePolicy::Abort {
                        report.skipped = tokens.len() - index - 1;
                        break;
                    }
                }
            }
        }

        if !report.superseded {
            self.state.emit(ExplorerEvent::EnrichmentFinished {
                generation,
                resolved: report.resolved,
                failed: report.failed,
                skipped: report.skipped,
            });
        }
        tracing::info!(
            "erc20 enrichment for {}: resolved={} failed={} skipped={} superseded={}",
            owner,
            report.resolved,
            report.failed,
            report.skipped,
            report.superseded
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::validate;
    use crate::services::testing::{not_found, token, FakeApi, OWNER_A};

    const TOKEN_A: &str = "0x00000000000000000000000000000000000000aa";
    const TOKEN_B: &str = "0x00000000000000000000000000000000000000bb";
    const TOKEN_C: &str = "0x00000000000000000000000000000000000000cc";

    async fn setup(policy: EnrichmentFailurePolicy) -> (Arc<FakeApi>, StateHandle, Erc20EnrichmentPipeline, u64) {
        let api = FakeApi::new();
        let state = StateHandle::new();
        let generation = state.write().await.next_generation(false);
        api.observe(state.clone());
        let pipeline = Erc20EnrichmentPipeline::new(api.clone(), state.clone(), policy);
        (api, state, pipeline, generation)
    }

    #[tokio::test]
    async fn publishes_each_value_before_next_request() {
        let (api, state, pipeline, generation) = setup(EnrichmentFailurePolicy::Isolate).await;
        api.with_balance(TOKEN_A, Ok("2500000000000000000"));
        api.with_balance(TOKEN_B, Ok("1234567"));
        let owner = validate(OWNER_A).unwrap();

        let report = pipeline
            .run(generation, &owner, &[token(TOKEN_A, "A", 18), token(TOKEN_B, "B", 6)])
            .await;

        assert_eq!(report.resolved, 2);
        assert_eq!(api.calls(), vec![format!("erc20:{}", TOKEN_A), format!("erc20:{}", TOKEN_B)]);
        // B diminta setelah nilai A sudah terbit
        assert_eq!(api.values_seen(), vec![0, 1]);
        let view = state.read().await.view();
        assert_eq!(view.token_value(TOKEN_A), Some(&TokenValue::Ready("2.500000".to_string())));
        assert_eq!(view.token_value(TOKEN_B), Some(&TokenValue::Ready("1.234567".to_string())));
    }

    #[tokio::test]
    async fn abort_policy_never_requests_remaining_tokens() {
        let (api, state, pipeline, generation) = setup(EnrichmentFailurePolicy::Abort).await;
        api.with_balance(TOKEN_A, Err(not_found()));
        api.with_balance(TOKEN_B, Ok("1"));
        let owner = validate(OWNER_A).unwrap();

        let report = pipeline
            .run(generation, &owner, &[token(TOKEN_A, "A", 18), token(TOKEN_B, "B", 6)])
            .await;

        assert_eq!(report, EnrichmentReport { resolved: 0, failed: 1, skipped: 1, superseded: false });
        assert_eq!(api.count_calls(&format!("erc20:{}", TOKEN_B)), 0);
        let view = state.read().await.view();
        assert!(matches!(view.token_value(TOKEN_A), Some(TokenValue::Failed(_))));
        assert_eq!(view.token_value(TOKEN_B), None);
    }

    #[tokio::test]
    async fn isolate_policy_resolves_siblings() {
        let (api, state, pipeline, generation) = setup(EnrichmentFailurePolicy::Isolate).await;
        api.with_balance(TOKEN_A, Ok("1000000"));
        api.with_balance(TOKEN_B, Err(not_found()));
        api.with_balance(TOKEN_C, Ok("not-a-number"));
        let owner = validate(OWNER_A).unwrap();
        let mut events = state.subscribe();

        let report = pipeline
            .run(
                generation,
                &owner,
                &[token(TOKEN_A, "A", 6), token(TOKEN_B, "B", 6), token(TOKEN_C, "C", 6)],
            )
            .await;

        assert_eq!(report.resolved, 1);
        assert_eq!(report.failed, 2);
        assert_eq!(api.count_calls("erc20:"), 3);
        let first = events.recv().await.unwrap();
        assert!(matches!(first, ExplorerEvent::TokenValueResolved { .. }));
    }

    #[tokio::test]
    async fn stops_when_generation_is_superseded() {
        let (api, state, pipeline, generation) = setup(EnrichmentFailurePolicy::Isolate).await;
        api.with_balance(TOKEN_A, Ok("1"));
        api.with_balance(TOKEN_B, Ok("1"));
        let gate = api.gate(&format!("erc20:{}", TOKEN_A));
        let owner = validate(OWNER_A).unwrap();
        let tokens = vec![token(TOKEN_A, "A", 6), token(TOKEN_B, "B", 6)];

        let run = {
            let tokens = tokens.clone();
            async move { pipeline.run(generation, &owner, &tokens).await }
        };
        let handle = tokio::spawn(run);
        tokio::task::yield_now().await;
        state.write().await.next_generation(true);
        gate.notify_one();
        let report = handle.await.unwrap();

        assert!(report.superseded);
        assert_eq!(report.resolved, 0);
        assert_eq!(api.count_calls(&format!("erc20:{}", TOKEN_B)), 0);
        assert!(state.read().await.token_values.is_empty());
    }
}
