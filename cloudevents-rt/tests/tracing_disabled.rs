//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//


//! Reporting switched off for the whole process. Lives in its own test
//! binary because the switch is global.

use cloudevents_rt::client::{Client, ClientConfig};
use cloudevents_rt::codec::{decode_structured, encode_structured};
use cloudevents_rt::event::{Event, SpecVersion};
use cloudevents_rt::observability::{self, Measure};
use cloudevents_rt::transport::RequestContext;
use cloudevents_rt::transport::kafka::{KafkaConfig, KafkaTransport, MemoryKafka};

#[tokio::test]
async fn test_disabled_tracing_records_nothing() {
    observability::enable_tracing(false);
    assert!(!observability::is_tracing_enabled());

    let measures = [Measure::Client, Measure::KafkaTransport, Measure::Codec, Measure::DataCodec];
    let before: Vec<u64> = measures
        .iter()
        .map(|m| m.metrics().total_observations())
        .collect();

    let broker = MemoryKafka::new();
    let client = Client::new(
        KafkaTransport::new(KafkaConfig::new("events"), broker.clone()),
        ClientConfig::new().with_uuids().with_time_now(),
    );
    let mut event = Event::new(SpecVersion::V10);
    event.set_type("com.example.test");
    event.set_source("/unit/test/client").unwrap();
    event.set_data(&serde_json::json!({"hello": "unittest"})).unwrap();
    client.send(&RequestContext::new(), event.clone()).await.unwrap();
    decode_structured(&encode_structured(&event).unwrap()).unwrap();

    assert_eq!(broker.records("events").len(), 1);
    let after: Vec<u64> = measures
        .iter()
        .map(|m| m.metrics().total_observations())
        .collect();
    assert_eq!(before, after);
}
