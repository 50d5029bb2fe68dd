use crate::grpc::{proto_kv_command, ProtoGetOp, ProtoKvCommand, ProtoPutOp};
use bytes::{Bytes, BytesMut};
use prost::Message;
use std::collections::HashMap;

/// ClientRequestKey identifies one client operation. Retries of that operation reuse it.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub struct ClientRequestKey {
    pub client_id: i64,
    pub request_id: i64,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum KvOperation {
    Get { key: String },
    Put { key: String, value: String },
}

/// KvCommand is what gets submitted to the consensus engine as a log entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct KvCommand {
    pub(crate) request: ClientRequestKey,
    pub(crate) operation: KvOperation,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum CommandDecodeError {
    #[error("Malformed command: {0}")]
    Malformed(#[from] prost::DecodeError),
    #[error("Command carries no operation")]
    MissingOperation,
}

impl KvCommand {
    pub(crate) fn encode(&self) -> Result<Bytes, prost::EncodeError> {
        let op = match &self.operation {
            KvOperation::Get { key } => proto_kv_command::Op::Get(ProtoGetOp { key: key.clone() }),
            KvOperation::Put { key, value } => proto_kv_command::Op::Put(ProtoPutOp {
                key: key.clone(),
                value: value.clone(),
            }),
        };
        let proto = ProtoKvCommand {
            client_id: self.request.client_id,
            request_id: self.request.request_id,
            op: Some(op),
        };

        let mut buf = BytesMut::with_capacity(proto.encoded_len());
        proto.encode(&mut buf)?;
        Ok(buf.freeze())
    }

    pub(crate) fn decode(data: Bytes) -> Result<Self, CommandDecodeError> {
        let proto = ProtoKvCommand::decode(data)?;
        let operation = match proto.op {
            Some(proto_kv_command::Op::Get(get)) => KvOperation::Get { key: get.key },
            Some(proto_kv_command::Op::Put(put)) => KvOperation::Put {
                key: put.key,
                value: put.value,
            },
            None => return Err(CommandDecodeError::MissingOperation),
        };

        Ok(KvCommand {
            request: ClientRequestKey {
                client_id: proto.client_id,
                request_id: proto.request_id,
            },
            operation,
        })
    }
}

/// OperationOutput is the response recorded for a client operation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OperationOutput {
    /// For Get, the current value ("" if absent). For Put, the value written.
    pub value: String,
}

#[derive(Debug)]
pub(crate) struct Applied {
    pub(crate) output: OperationOutput,
    /// True if this request was already applied; `output` is the recorded one.
    pub(crate) duplicate: bool,
}

/// KvStateMachine applies committed commands. Each `ClientRequestKey` is applied at most once;
/// repeats get the output recorded the first time.
#[derive(Default)]
pub(crate) struct KvStateMachine {
    data: HashMap<String, String>,
    applied_requests: HashMap<ClientRequestKey, OperationOutput>,
}

impl KvStateMachine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn apply(&mut self, command: KvCommand) -> Applied {
        if let Some(recorded) = self.applied_requests.get(&command.request) {
            return Applied {
                output: recorded.clone(),
                duplicate: true,
            };
        }

        let output = match command.operation {
            KvOperation::Get { key } => OperationOutput {
                value: self.data.get(&key).cloned().unwrap_or_default(),
            },
            KvOperation::Put { key, value } => {
                self.data.insert(key, value.clone());
                OperationOutput { value }
            }
        };

        self.applied_requests.insert(command.request, output.clone());
        Applied {
            output,
            duplicate: false,
        }
    }

    pub(crate) fn recorded_output(&self, request: &ClientRequestKey) -> Option<OperationOutput> {
        self.applied_requests.get(request).cloned()
    }

    #[cfg(test)]
    pub(crate) fn value(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(client_id: i64, request_id: i64, key: &str, value: &str) -> KvCommand {
        KvCommand {
            request: ClientRequestKey { client_id, request_id },
            operation: KvOperation::Put {
                key: key.into(),
                value: value.into(),
            },
        }
    }

    fn get(client_id: i64, request_id: i64, key: &str) -> KvCommand {
        KvCommand {
            request: ClientRequestKey { client_id, request_id },
            operation: KvOperation::Get { key: key.into() },
        }
    }

    #[test]
    fn put_then_get() {
        let mut sm = KvStateMachine::new();

        assert_eq!(sm.apply(get(1, 1, "k")).output.value, "");
        assert_eq!(sm.apply(put(1, 2, "k", "v")).output.value, "v");
        assert_eq!(sm.apply(get(1, 3, "k")).output.value, "v");
    }

    #[test]
    fn repeated_request_applies_once() {
        let mut sm = KvStateMachine::new();

        let first = sm.apply(put(7, 1, "k", "v1"));
        assert!(!first.duplicate);
        sm.apply(put(7, 2, "k", "v2"));

        // A late retry of request 1 must not clobber request 2.
        let retry = sm.apply(put(7, 1, "k", "v1"));
        assert!(retry.duplicate);
        assert_eq!(retry.output, first.output);
        assert_eq!(sm.value("k"), Some("v2"));
    }

    #[test]
    fn reads_are_recorded_too() {
        let mut sm = KvStateMachine::new();
        sm.apply(put(1, 1, "k", "old"));
        sm.apply(get(2, 1, "k"));
        sm.apply(put(1, 2, "k", "new"));

        // Retried read returns what the first read saw.
        let retry = sm.apply(get(2, 1, "k"));
        assert!(retry.duplicate);
        assert_eq!(retry.output.value, "old");
    }

    #[test]
    fn same_request_id_different_clients() {
        let mut sm = KvStateMachine::new();
        sm.apply(put(1, 1, "a", "x"));

        assert!(!sm.apply(put(2, 1, "b", "y")).duplicate);
        assert_eq!(sm.value("a"), Some("x"));
        assert_eq!(sm.value("b"), Some("y"));
    }

    #[test]
    fn command_encoding() {
        let command = put(-3, i64::MAX, "key", "value");
        assert_eq!(KvCommand::decode(command.encode().unwrap()).unwrap(), command);

        let command = get(0, 0, "");
        assert_eq!(KvCommand::decode(command.encode().unwrap()).unwrap(), command);

        let no_op = ProtoKvCommand {
            client_id: 1,
            request_id: 1,
            op: None,
        };
        let mut buf = BytesMut::new();
        no_op.encode(&mut buf).unwrap();
        assert!(matches!(
            KvCommand::decode(buf.freeze()),
            Err(CommandDecodeError::MissingOperation)
        ));

        assert!(KvCommand::decode(Bytes::from_static(&[0xff, 0xff, 0xff])).is_err());
    }

    #[test]
    fn large_value_encodes_whole() {
        let value = "v".repeat(1 << 20);
        let command = put(1, 2, "big", &value);

        let data = command.encode().unwrap();
        assert!(data.len() > value.len());
        assert_eq!(KvCommand::decode(data).unwrap(), command);
    }
}
