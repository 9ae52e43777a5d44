//! 指纹的性质验证：确定性、区分性与编码无歧义。

use coral_client::fingerprint;
use coral_core::transport::SessionProfile;
use proptest::prelude::*;
use std::time::Duration;

fn profile_strategy() -> impl Strategy<Value = SessionProfile> {
    (
        proptest::option::of("[a-z][a-z0-9_-]{0,15}"),
        1_u64..600_000,
        1_u64..600_000,
        1_u64..600_000,
        1_u64..10_000,
        any::<bool>(),
        any::<bool>(),
        "[a-z0-9@.]{1,24}",
        any::<bool>(),
        proptest::collection::vec(any::<[u8; 32]>(), 0..4),
    )
        .prop_map(
            |(
                bucket,
                connect_ms,
                kv_ms,
                kv_durable_ms,
                poll_ms,
                use_mutation_tokens,
                use_server_durations,
                auth_identity,
                tls_skip_verify,
                trust_root_digests,
            )| SessionProfile {
                bucket,
                connect_timeout: Duration::from_millis(connect_ms),
                kv_timeout: Duration::from_millis(kv_ms),
                kv_durable_timeout: Duration::from_millis(kv_durable_ms),
                durability_poll_interval: Duration::from_millis(poll_ms),
                use_mutation_tokens,
                use_server_durations,
                auth_identity,
                tls_skip_verify,
                trust_root_digests,
            },
        )
}

proptest! {
    /// 相同画像在任意时刻重算都得到同一指纹。
    #[test]
    fn recomputation_is_deterministic(profile in profile_strategy()) {
        prop_assert_eq!(fingerprint(&profile), fingerprint(&profile.clone()));
    }

    /// 指纹始终是 64 位小写十六进制。
    #[test]
    fn rendering_is_lowercase_hex(profile in profile_strategy()) {
        let print = fingerprint(&profile);
        prop_assert_eq!(print.as_str().len(), 64);
        prop_assert!(print.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    /// 桶名不同则指纹不同；长度前缀编码杜绝拼接歧义。
    #[test]
    fn bucket_name_always_separates(
        profile in profile_strategy(),
        a in "[a-z]{1,12}",
        b in "[a-z]{1,12}",
    ) {
        prop_assume!(a != b);
        let mut left = profile.clone();
        left.bucket = Some(a);
        let mut right = profile;
        right.bucket = Some(b);
        prop_assert_ne!(fingerprint(&left), fingerprint(&right));
    }

    /// 任一超时字段的变化都会改变指纹。
    #[test]
    fn kv_timeout_always_separates(
        profile in profile_strategy(),
        delta_ms in 1_u64..60_000,
    ) {
        let mut changed = profile.clone();
        changed.kv_timeout = profile.kv_timeout + Duration::from_millis(delta_ms);
        prop_assert_ne!(fingerprint(&profile), fingerprint(&changed));
    }

    /// 鉴权身份参与指纹：不同身份从不共享连接。
    #[test]
    fn auth_identity_always_separates(
        profile in profile_strategy(),
        other in "[a-z0-9@.]{1,24}",
    ) {
        prop_assume!(profile.auth_identity != other);
        let mut changed = profile.clone();
        changed.auth_identity = other;
        prop_assert_ne!(fingerprint(&profile), fingerprint(&changed));
    }
}
