// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use confplane_translate as translate;

use model::{
    DataObject, Identifier, Key, Modification, ModificationBatch, NodeTypeId, SchemaBuilder,
};
use naming::{NamingStore, store::shared};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use test_utils::device::{DeviceState, FakeDevice};
use test_utils::{INTERFACE_NAMESPACE, SampleModel, sample_model, sample_readers, sample_writers};
use tracing_test::traced_test;
use translate::{
    CustomizerError, ReadContext, ReaderCustomizer, ReaderRegistry, ReaderRegistryBuilder,
    WriteContext, WriteError, WriterCustomizer, WriterRegistry, WriterRegistryBuilder,
};

struct Fixture {
    model: SampleModel,
    device: Arc<FakeDevice>,
    store: naming::SharedNamingStore,
    writers: WriterRegistry,
    readers: ReaderRegistry,
}

fn fixture() -> Fixture {
    let model = sample_model();
    let device = Arc::new(FakeDevice::new());
    let store = shared(NamingStore::in_memory());
    let writers = sample_writers(&model, &device, store.clone()).unwrap();
    let readers = sample_readers(&model, &device, store.clone()).unwrap();
    Fixture {
        model,
        device,
        store,
        writers,
        readers,
    }
}

fn interface_id(f: &Fixture, name: &str) -> Identifier {
    Identifier::keyed(&f.model.schema, f.model.interface, name)
}

fn create_interface(f: &Fixture, name: &str, mtu: u32) -> Modification {
    Modification::Create {
        id: interface_id(f, name),
        data: DataObject::list_entry(f.model.interface, name)
            .with_attr("mtu", mtu)
            .with_attr("enabled", true),
    }
}

fn create_bridge(f: &Fixture, name: &str) -> Modification {
    Modification::Create {
        id: Identifier::keyed(&f.model.schema, f.model.bridge_domain, name),
        data: DataObject::list_entry(f.model.bridge_domain, name).with_attr("flood", true),
    }
}

fn create_member(f: &Fixture, bridge: &str, interface: &str) -> Modification {
    Modification::Create {
        id: Identifier::keyed(&f.model.schema, f.model.bridge_domain, bridge).child_keyed(
            &f.model.schema,
            f.model.member,
            interface,
        ),
        data: DataObject::list_entry(f.model.member, interface),
    }
}

fn create_address(f: &Fixture, interface: &str, address: &str) -> Modification {
    Modification::Create {
        id: interface_id(f, interface).child_keyed(&f.model.schema, f.model.address, address),
        data: DataObject::list_entry(f.model.address, address),
    }
}

fn batch(mods: Vec<Modification>) -> ModificationBatch {
    ModificationBatch::new(mods).unwrap()
}

#[test]
#[traced_test]
fn create_maps_name_and_read_returns_it() {
    let mut f = fixture();
    f.writers
        .update(&batch(vec![create_interface(&f, "eth0", 1500)]))
        .unwrap();

    // the committed naming context now maps eth0
    let handle = f
        .store
        .read()
        .context(INTERFACE_NAMESPACE)
        .unwrap()
        .handle_of("eth0")
        .unwrap();
    assert_eq!(
        f.store.read().context(INTERFACE_NAMESPACE).unwrap().name_of(handle),
        Some("eth0")
    );

    // reading the interface list yields exactly that entry
    let list = f
        .readers
        .read_list(&Identifier::typed(&f.model.schema, f.model.interface))
        .unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].key(), Some(&Key::from("eth0")));
    assert_eq!(list[0].attr("mtu"), Some(&model::Value::Num(1500)));
}

#[test]
#[traced_test]
fn failed_member_create_reverts_the_whole_batch() {
    let mut f = fixture();
    f.device.fail_on("bridge-member-add");

    let err = f
        .writers
        .update(&batch(vec![
            create_interface(&f, "eth0", 1500),
            create_bridge(&f, "bd1"),
            create_member(&f, "bd1", "eth0"),
        ]))
        .unwrap_err();
    assert!(matches!(err, WriteError::CreateFailed { .. }));

    // neither the interface nor the bridge domain survived
    assert_eq!(f.device.snapshot(), DeviceState::default());
    // and no naming entry remains for either resource
    assert!(f.store.read().context(INTERFACE_NAMESPACE).is_none());
    assert!(f.store.read().context("bridge-domains").is_none());

    // applied in registration order, reverted in reverse order
    assert_eq!(
        f.device.ops(),
        vec![
            "interface-create",
            "bridge-domain-add",
            "bridge-member-add",
            "bridge-domain-del",
            "interface-delete",
        ]
    );
}

#[test]
#[traced_test]
fn apply_then_inverse_restores_the_device() {
    let mut f = fixture();
    let pre = f.device.snapshot();

    let b = batch(vec![
        create_interface(&f, "eth0", 9000),
        create_address(&f, "eth0", "10.0.0.1/24"),
        create_bridge(&f, "bd1"),
        create_member(&f, "bd1", "eth0"),
    ]);
    f.writers.update(&b).unwrap();
    assert_ne!(f.device.snapshot(), pre);

    f.writers.update(&b.inverse()).unwrap();
    assert_eq!(f.device.snapshot(), pre);
}

#[test]
#[traced_test]
fn wildcarded_create_takes_its_key_from_the_payload() {
    let mut f = fixture();
    let wildcard = Identifier::typed(&f.model.schema, f.model.interface);
    assert!(wildcard.is_wildcarded());

    f.writers
        .update(&batch(vec![Modification::Create {
            id: wildcard,
            data: DataObject::list_entry(f.model.interface, "eth7").with_attr("mtu", 1500_u32),
        }]))
        .unwrap();

    // the dispatched identifier was concrete: the mapping is keyed eth7
    assert!(
        f.store
            .read()
            .context(INTERFACE_NAMESPACE)
            .unwrap()
            .contains("eth7")
    );
    let read = f.readers.read(&interface_id(&f, "eth7")).unwrap();
    assert_eq!(read.unwrap().key(), Some(&Key::from("eth7")));
}

#[test]
#[traced_test]
fn wildcarded_create_without_payload_key_is_rejected() {
    let mut f = fixture();
    let err = f
        .writers
        .update(&batch(vec![Modification::Create {
            id: Identifier::typed(&f.model.schema, f.model.interface),
            data: DataObject::container(f.model.interface),
        }]))
        .unwrap_err();
    assert!(matches!(err, WriteError::MissingKey(_)));
    assert_eq!(f.device.ops(), Vec::<String>::new());
}

#[test]
#[traced_test]
fn duplicate_create_fails_before_touching_the_device() {
    let mut f = fixture();
    f.writers
        .update(&batch(vec![create_interface(&f, "eth0", 1500)]))
        .unwrap();
    f.device.clear_ops();

    let err = f
        .writers
        .update(&batch(vec![create_interface(&f, "eth0", 1500)]))
        .unwrap_err();
    assert!(matches!(err, WriteError::DuplicateCreate(_)));
    assert_eq!(f.device.ops(), Vec::<String>::new());
}

#[test]
#[traced_test]
fn unmapped_delete_and_update_are_not_found() {
    let mut f = fixture();
    let err = f
        .writers
        .update(&batch(vec![Modification::Delete {
            id: interface_id(&f, "eth9"),
            before: DataObject::list_entry(f.model.interface, "eth9"),
        }]))
        .unwrap_err();
    assert!(matches!(err, WriteError::NotFound(_)));

    let err = f
        .writers
        .update(&batch(vec![Modification::Update {
            id: interface_id(&f, "eth9"),
            before: DataObject::list_entry(f.model.interface, "eth9"),
            after: DataObject::list_entry(f.model.interface, "eth9").with_attr("mtu", 9000_u32),
        }]))
        .unwrap_err();
    assert!(matches!(err, WriteError::NotFound(_)));
    assert_eq!(f.device.ops(), Vec::<String>::new());
}

#[test]
#[traced_test]
fn update_without_customizer_support_is_unsupported() {
    let mut f = fixture();
    f.writers
        .update(&batch(vec![
            create_interface(&f, "eth0", 1500),
            create_address(&f, "eth0", "10.0.0.1/24"),
        ]))
        .unwrap();
    f.device.clear_ops();

    let id = interface_id(&f, "eth0").child_keyed(&f.model.schema, f.model.address, "10.0.0.1/24");
    let err = f
        .writers
        .update(&batch(vec![Modification::Update {
            id,
            before: DataObject::list_entry(f.model.address, "10.0.0.1/24"),
            after: DataObject::list_entry(f.model.address, "10.0.0.1/24").with_attr("tag", 1_u32),
        }]))
        .unwrap_err();
    assert!(matches!(err, WriteError::UnsupportedOperation(_)));
    assert_eq!(f.device.ops(), Vec::<String>::new());
}

#[test]
#[traced_test]
fn supported_update_runs_in_place() {
    let mut f = fixture();
    f.writers
        .update(&batch(vec![create_interface(&f, "eth0", 1500)]))
        .unwrap();

    f.writers
        .update(&batch(vec![Modification::Update {
            id: interface_id(&f, "eth0"),
            before: DataObject::list_entry(f.model.interface, "eth0").with_attr("mtu", 1500_u32),
            after: DataObject::list_entry(f.model.interface, "eth0").with_attr("mtu", 9000_u32),
        }]))
        .unwrap();

    let read = f.readers.read(&interface_id(&f, "eth0")).unwrap().unwrap();
    assert_eq!(read.attr("mtu"), Some(&model::Value::Num(9000)));
}

#[test]
#[traced_test]
fn deletes_run_first_in_reverse_registration_order() {
    let mut f = fixture();
    f.writers
        .update(&batch(vec![
            create_interface(&f, "eth0", 1500),
            create_bridge(&f, "bd1"),
            create_member(&f, "bd1", "eth0"),
        ]))
        .unwrap();
    f.device.clear_ops();

    // submit in scrambled order with a create mixed in
    f.writers
        .update(&batch(vec![
            Modification::Delete {
                id: interface_id(&f, "eth0"),
                before: DataObject::list_entry(f.model.interface, "eth0"),
            },
            create_interface(&f, "eth1", 1500),
            Modification::Delete {
                id: Identifier::keyed(&f.model.schema, f.model.bridge_domain, "bd1"),
                before: DataObject::list_entry(f.model.bridge_domain, "bd1"),
            },
            Modification::Delete {
                id: Identifier::keyed(&f.model.schema, f.model.bridge_domain, "bd1")
                    .child_keyed(&f.model.schema, f.model.member, "eth0"),
                before: DataObject::list_entry(f.model.member, "eth0"),
            },
        ]))
        .unwrap();

    assert_eq!(
        f.device.ops(),
        vec![
            "bridge-member-del",
            "bridge-domain-del",
            "interface-delete",
            "interface-create",
        ]
    );
}

#[test]
#[traced_test]
fn empty_batch_is_a_noop() {
    let mut f = fixture();
    f.writers.update(&ModificationBatch::empty()).unwrap();
    assert_eq!(f.device.ops(), Vec::<String>::new());
}

#[test]
#[traced_test]
fn read_merges_children_bottom_up() {
    let mut f = fixture();
    f.writers
        .update(&batch(vec![
            create_interface(&f, "eth0", 1500),
            create_address(&f, "eth0", "10.0.0.1/24"),
            create_address(&f, "eth0", "10.0.0.2/24"),
            create_bridge(&f, "bd1"),
            create_member(&f, "bd1", "eth0"),
        ]))
        .unwrap();

    let interfaces = f
        .readers
        .read(&Identifier::typed(&f.model.schema, f.model.interfaces))
        .unwrap()
        .unwrap();
    let eth0 = interfaces
        .child_keyed(f.model.interface, &Key::from("eth0"))
        .unwrap();
    let addresses: Vec<_> = eth0
        .children_of_type(f.model.address)
        .filter_map(DataObject::key)
        .map(ToString::to_string)
        .collect();
    assert_eq!(addresses, vec!["10.0.0.1/24", "10.0.0.2/24"]);

    let tree = f.readers.read_all().unwrap();
    assert_eq!(tree.len(), 2);
    let bridges = &tree[1];
    let bd1 = bridges
        .child_keyed(f.model.bridge_domain, &Key::from("bd1"))
        .unwrap();
    assert_eq!(bd1.children_of_type(f.model.member).count(), 1);
}

#[test]
#[traced_test]
fn absent_nodes_read_as_none() {
    let f = fixture();
    assert_eq!(f.readers.read(&interface_id(&f, "eth0")).unwrap(), None);
    // structural roots with no content are absent too
    assert_eq!(
        f.readers
            .read(&Identifier::typed(&f.model.schema, f.model.interfaces))
            .unwrap(),
        None
    );
}

#[test]
#[traced_test]
fn one_read_issues_one_interface_dump() {
    let mut f = fixture();
    f.writers
        .update(&batch(vec![
            create_interface(&f, "eth0", 1500),
            create_address(&f, "eth0", "10.0.0.1/24"),
            create_interface(&f, "eth1", 1500),
            create_address(&f, "eth1", "10.0.1.1/24"),
        ]))
        .unwrap();
    f.device.clear_ops();

    let _ = f
        .readers
        .read(&Identifier::typed(&f.model.schema, f.model.interfaces))
        .unwrap();
    let dumps = f
        .device
        .ops()
        .iter()
        .filter(|op| op.as_str() == "interface-dump")
        .count();
    // interface and address readers share one dump per read session
    assert_eq!(dumps, 1);
}

#[test]
#[traced_test]
fn names_resolve_identically_after_restart() {
    let path =
        std::env::temp_dir().join(format!("confplane-engine-{}.yaml", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let model = sample_model();
    let device = Arc::new(FakeDevice::new());
    let handle = {
        let store = shared(NamingStore::open(&path).unwrap());
        let mut writers = sample_writers(&model, &device, store.clone()).unwrap();
        writers
            .update(&ModificationBatch::new(vec![Modification::Create {
                id: Identifier::keyed(&model.schema, model.interface, "eth0"),
                data: DataObject::list_entry(model.interface, "eth0").with_attr("mtu", 1500_u32),
            }]).unwrap())
            .unwrap();
        store
            .read()
            .context(INTERFACE_NAMESPACE)
            .unwrap()
            .handle_of("eth0")
            .unwrap()
    };

    // a fresh process opens the same store and sees the same mapping
    let store = shared(NamingStore::open(&path).unwrap());
    let readers = sample_readers(&model, &device, store.clone()).unwrap();
    let list = readers
        .read_list(&Identifier::typed(&model.schema, model.interface))
        .unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].key(), Some(&Key::from("eth0")));
    assert_eq!(
        store.read().context(INTERFACE_NAMESPACE).unwrap().handle_of("eth0"),
        Some(handle)
    );

    let _ = std::fs::remove_file(&path);
}

#[derive(Default)]
struct RecordingWriter {
    log: Arc<Mutex<Vec<String>>>,
}

impl WriterCustomizer for RecordingWriter {
    fn write_current(
        &self,
        id: &Identifier,
        _data: &DataObject,
        _ctx: &mut WriteContext,
    ) -> Result<(), CustomizerError> {
        self.log.lock().unwrap().push(format!("create {id}"));
        Ok(())
    }

    fn update_current(
        &self,
        id: &Identifier,
        _before: &DataObject,
        _after: &DataObject,
        _ctx: &mut WriteContext,
    ) -> Result<(), CustomizerError> {
        self.log.lock().unwrap().push(format!("update {id}"));
        Ok(())
    }

    fn delete_current(
        &self,
        id: &Identifier,
        _before: &DataObject,
        _ctx: &mut WriteContext,
    ) -> Result<(), CustomizerError> {
        self.log.lock().unwrap().push(format!("delete {id}"));
        Ok(())
    }
}

fn vlan_schema() -> (Arc<model::Schema>, NodeTypeId, NodeTypeId, NodeTypeId) {
    let mut builder = SchemaBuilder::new();
    let interfaces = builder.container("interfaces", None).unwrap();
    let interface = builder.list("interface", Some(interfaces)).unwrap();
    let rewrite = builder.container("vlan-rewrite", Some(interface)).unwrap();
    (Arc::new(builder.build()), interfaces, interface, rewrite)
}

#[test]
#[traced_test]
fn subtree_registration_governs_descendants() {
    let (schema, interfaces, interface, rewrite) = vlan_schema();
    let store = shared(NamingStore::in_memory());
    let writer = RecordingWriter::default();
    let log = writer.log.clone();

    let mut builder = WriterRegistryBuilder::new(schema.clone(), store);
    builder.add_noop(interfaces).unwrap();
    builder
        .subtree_add(interface, &[rewrite], Box::new(writer))
        .unwrap();
    let mut registry = builder.build().unwrap();

    let rewrite_id =
        Identifier::keyed(&schema, interface, "eth0").child(&schema, rewrite);
    registry
        .update(
            &ModificationBatch::new(vec![Modification::Create {
                id: rewrite_id,
                data: DataObject::container(rewrite).with_attr("pop-tags", 1_u32),
            }])
            .unwrap(),
        )
        .unwrap();

    // the subtree customizer received the child modification, with the
    // parent key intact
    assert_eq!(
        log.lock().unwrap().clone(),
        vec!["create /interfaces/interface[eth0]/vlan-rewrite".to_string()]
    );
}

struct EmbeddingReader;

impl ReaderCustomizer for EmbeddingReader {
    fn read_current(
        &self,
        id: &Identifier,
        _ctx: &mut ReadContext,
    ) -> Result<Option<DataObject>, CustomizerError> {
        // returns the whole subtree payload, children embedded
        let ty = id.target_type();
        Ok(Some(
            DataObject::container(ty).with_attr("embedded", true),
        ))
    }
}

#[test]
#[traced_test]
fn subtree_reader_children_are_not_read_twice() {
    let mut builder = SchemaBuilder::new();
    let system = builder.container("system", None).unwrap();
    let clock = builder.container("clock", Some(system)).unwrap();
    let schema = Arc::new(builder.build());
    let store = shared(NamingStore::in_memory());

    let mut registry = ReaderRegistryBuilder::new(schema.clone(), store);
    registry
        .subtree_add(system, &[clock], Box::new(EmbeddingReader))
        .unwrap();
    let registry = registry.build().unwrap();

    let read = registry
        .read(&Identifier::typed(&schema, system))
        .unwrap()
        .unwrap();
    // no recursion into governed children: only the customizer's payload
    assert_eq!(read.children().len(), 0);
    assert_eq!(read.attr("embedded"), Some(&model::Value::Bool(true)));
}
